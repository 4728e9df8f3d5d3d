//! Plain-text renderings of the swarm for terminals.

use std::fmt::Write;

use ds_core::Step;
use ds_plan::FlightPlan;
use ds_sim::DroneSnapshot;

/// Columns of the grid window (x = 0..GRID_WIDTH).
pub const GRID_WIDTH: usize = 20;
/// Rows of the grid window (y = 0..GRID_HEIGHT).
pub const GRID_HEIGHT: usize = 10;

/// Top-down X/Y view of the drones inside the fixed window.
///
/// A cell shows the last digit of the drone's id, or `*` when several drones
/// share the X/Y column (whatever their heights).  Drones outside the window
/// are not drawn.  Row `y = GRID_HEIGHT - 1` is printed first.
pub fn render_grid(step: Step, drones: &[DroneSnapshot]) -> String {
    let mut grid = [['.'; GRID_WIDTH]; GRID_HEIGHT];
    for d in drones {
        let (Ok(x), Ok(y)) = (usize::try_from(d.position.x), usize::try_from(d.position.y)) else {
            continue;
        };
        if x >= GRID_WIDTH || y >= GRID_HEIGHT {
            continue;
        }
        let cell = &mut grid[y][x];
        *cell = if *cell == '.' {
            char::from_digit(d.id.get() % 10, 10).unwrap_or('?')
        } else {
            '*'
        };
    }

    let border = format!("  +{}+", "-".repeat(GRID_WIDTH));
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Step {} - Drone Grid (X:0-{}, Y:0-{}):",
        step.get(),
        GRID_WIDTH - 1,
        GRID_HEIGHT - 1,
    );
    let _ = writeln!(out, "{border}");
    for (y, row) in grid.iter().enumerate().rev() {
        let _ = writeln!(out, "{y:2}|{}|", row.iter().collect::<String>());
    }
    let _ = writeln!(out, "{border}");
    let _ = writeln!(out, "  Legend: '.' = empty, '0-9' = drone id, '*' = several drones in cell (X,Y)");
    out
}

/// One line per drone: position, status and progress through its plan.
///
/// `plans` must be in the same order as `drones` (plan/slot order).
pub fn render_status_list(step: Step, drones: &[DroneSnapshot], plans: &[FlightPlan]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Drone States (Step {}):", step.get());
    for (d, plan) in drones.iter().zip(plans) {
        let status = if d.finished {
            "FINISHED"
        } else if d.active {
            "Active"
        } else {
            "Inactive"
        };
        let done = d.last_executed.map_or(0, |i| i + 1);
        let _ = writeln!(
            out,
            "  Drone ID {:2}: Pos ({:3}, {:3}, {:3}) - Status: {:<10} - Instr: {}/{}",
            d.id.get(),
            d.position.x,
            d.position.y,
            d.position.z,
            status,
            done,
            plan.len(),
        );
    }
    out
}
