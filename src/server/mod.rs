// Server module entry point
// Binds the listening socket and runs the accept loop

pub mod connection;
pub mod listener;
pub mod stream;

// Rust does not allow `loop` as a module name (keyword), so use `server_loop`
#[path = "loop.rs"]
pub mod server_loop;

// Re-export commonly used items
pub use listener::create_listener;
pub use server_loop::run_accept_loop;
