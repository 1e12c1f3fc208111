use super::context::TickContext;

/// One phase of the yearly turn.
///
/// Object-safe so phases can be stored as `Box<dyn SimSystem>` and run in
/// registration order. `Send + Sync` so an engine can sit behind an async lock.
pub trait SimSystem: Send + Sync {
    fn name(&self) -> &str;
    fn tick(&mut self, ctx: &mut TickContext);
}
