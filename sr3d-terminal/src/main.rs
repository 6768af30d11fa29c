/// SR3D Terminal Viewer
///
/// Renders an OBJ model, or a cube when none is given, in the terminal.
/// Controls:
///   - WASD: Move the camera
///   - Arrow Keys: Look around
///   - Q/ESC: Quit
///
/// Set `SR3D_LOG=<file>` to write a log while the screen is in use.

use sr3d_core::{Mesh, Vector3D};
use sr3d_terminal::{logger, TerminalApp};
use std::env;
use std::io;

/// Models are placed this far in front of the camera
const MODEL_DISTANCE: f32 = 100.0;

fn main() -> io::Result<()> {
    if let Err(e) = logger::init_from_env() {
        eprintln!("Could not open log file: {}", e);
    }

    let mut mesh = match env::args().nth(1) {
        Some(path) => {
            println!("Loading OBJ file: {}", path);
            Mesh::load(&path)
        }
        None => Mesh::new(),
    };

    let spin = if mesh.is_empty() {
        println!("No triangles loaded, using default cube...");
        mesh = Mesh::cube(40.0);
        0.6
    } else {
        println!("Loaded {} triangles", mesh.len());
        0.0
    };
    mesh.position = Vector3D::new(0.0, 0.0, -MODEL_DISTANCE);

    let mut app = TerminalApp::new(mesh)?.with_spin(spin);
    app.run()?;

    log::logger().flush();
    Ok(())
}
