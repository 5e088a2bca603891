mod grid;
mod shell_mesh;

pub use grid::ShellGrid;
pub use shell_mesh::{ShellMesh, UnitShell};
