/// Example: Parse an OBJ file and report what a frame would draw
///
/// Usage: cargo run --example obj_info -- path/to/file.obj

use sr3d_core::{obj, Engine, EngineConfig, PixelBuffer, Vector3D};
use std::env;
use std::process::ExitCode;

fn main() -> ExitCode {
    let Some(path) = env::args().nth(1) else {
        eprintln!("Usage: obj_info <obj-file>");
        return ExitCode::FAILURE;
    };

    let parsed = obj::read_obj(&path);
    println!("{}: {} triangles", path, parsed.mesh.len());
    if let Some(e) = &parsed.error {
        println!("stopped early: {}", e);
    }

    let mut mesh = parsed.mesh;
    mesh.position = Vector3D::new(0.0, 0.0, -100.0);

    let config = EngineConfig::default().with_viewport(320, 180);
    let mut surface = PixelBuffer::new(config.width, config.height);
    let mut engine = match Engine::new(config, mesh) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    match engine.render(&mut surface) {
        Ok(stats) => {
            println!(
                "drawn {} / culled {} / degenerate {} triangles, {} pixels",
                stats.rasterized, stats.culled, stats.degenerate, stats.pixels_written
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
