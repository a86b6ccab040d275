// main.rs — headless map inspector
//
// ibsp-inspect <map.bsp> [+set name value ...]
//
// Loads the map, prints its lump summary, drops a player hull from a spawn
// point onto the floor and runs one visibility pass from its eyes.

use std::process::ExitCode;

use ibsp_common::common::{com_printf, com_register_cvars};
use ibsp_common::cvar::{cvar_init, cvar_shutdown, cvar_variable_value, with_cvar_ctx};
use ibsp_common::entities::SpawnPoint;
use ibsp_common::pmove::{KinematicBody, MoveOutcome, MoveParams};
use ibsp_common::q_shared::{vector_add, vector_scale};
use ibsp_common::vis::{Camera, VisOptions};
use ibsp_common::world::World;

const FRAME_TIME: f32 = 0.05;
const MAX_DROP_FRAMES: usize = 200;
const VIEW_HEIGHT: f32 = 26.0;

fn main() -> ExitCode {
    cvar_init();
    com_register_cvars();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let rest = with_cvar_ctx(|c| c.apply_command_line(&args)).unwrap_or_default();
    let Some(path) = rest.first() else {
        com_printf("usage: ibsp-inspect <map.bsp> [+set name value ...]\n");
        return ExitCode::FAILURE;
    };

    let mut world = World::new();
    let fallback = match world.load_map(path) {
        Ok(map) => {
            map.print_info();
            // middle of the world model when the map has no player starts
            map.world_model().map_or([0.0; 3], |m| {
                vector_scale(&vector_add(&m.mins, &m.maxs), 0.5)
            })
        }
        Err(e) => {
            com_printf(&format!("{}\n", e));
            return ExitCode::FAILURE;
        }
    };

    let spawn = world.find_spawn_point().unwrap_or_else(|| {
        com_printf("no spawn points, starting from the world center\n");
        SpawnPoint { origin: fallback, yaw: 0.0 }
    });
    com_printf(&format!(
        "spawn at ({:.1} {:.1} {:.1}) facing {:.0}\n",
        spawn.origin[0], spawn.origin[1], spawn.origin[2], spawn.yaw
    ));

    let params = MoveParams::player_from_cvars();
    let gravity = cvar_variable_value("pm_gravity");
    let mut body = KinematicBody::new(spawn.origin);
    let mut frames = 0;
    while !body.grounded && frames < MAX_DROP_FRAMES {
        body.apply_gravity(gravity, FRAME_TIME);
        let Some(report) = world.slide_move(&mut body, &params, FRAME_TIME) else {
            break;
        };
        frames += 1;
        match report.outcome {
            MoveOutcome::Completed => {}
            MoveOutcome::StuckInSolid => {
                com_printf("player is stuck in solid\n");
                break;
            }
            other => com_printf(&format!("frame {}: {:?}\n", frames, other)),
        }
    }
    if body.grounded {
        com_printf(&format!(
            "landed at z {:.3} after {} frames\n",
            body.origin[2], frames
        ));
    } else {
        com_printf(&format!("still falling after {} frames\n", frames));
    }

    let mut eye = body.origin;
    eye[2] += VIEW_HEIGHT;
    let camera = Camera::new(eye, &[0.0, spawn.yaw, 0.0], 90.0, 4.0 / 3.0, 4.0, 8192.0);
    if let Some(stats) = world.update_visibility(&camera, VisOptions::from_cvars()) {
        com_printf(&format!(
            "leaf {} cluster {}: {} leafs visible, {} culled ({} pvs, {} frustum)\n",
            stats.current_leaf,
            stats.current_cluster,
            stats.leafs_visible,
            stats.leafs_culled(),
            stats.leafs_pvs_culled,
            stats.leafs_frustum_culled
        ));
        com_printf(&format!(
            "{} faces, {} patches, {} billboards, {} vertexes, {} indexes\n",
            stats.faces_visible,
            stats.patches_visible,
            stats.billboards_visible,
            stats.vertexes_visible,
            stats.indexes_visible
        ));
    }

    world.free_map();
    cvar_shutdown();
    ExitCode::SUCCESS
}
