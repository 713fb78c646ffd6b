//! Illustra Terminal Demo - Rotating Mesh With Its Mirror Image
//!
//! Usage: illustra-terminal [path/to/file.stl]
//!
//! Without a path a cube is shown.
//! Controls:
//!   - WASD / Arrow Keys: Rotate the model
//!   - E/R: Roll rotation
//!   - M: Toggle the mirrored copy
//!   - F: Toggle the wireframe overlay
//!   - Q/ESC: Quit

use illustra_core::shapes;
use illustra_terminal::{stl, TerminalApp, TerminalConfig};
use std::env;
use std::io;
use std::path::Path;

fn main() -> io::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let mesh = match env::args().nth(1) {
        Some(path) => {
            println!("Loading STL file: {}", path);
            stl::load(Path::new(&path))
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?
        }
        None => shapes::cube(2.0),
    };

    println!("Loaded {} triangles", mesh.faces.len());
    println!("Starting terminal renderer (press Q to quit)...");
    std::thread::sleep(std::time::Duration::from_secs(1));

    // Run the terminal app
    let mut app = TerminalApp::new(&mesh, TerminalConfig::default())?;
    app.run()?;

    println!("Thank you for using the Illustra Terminal Renderer!");
    Ok(())
}
