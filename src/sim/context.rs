use rand::RngCore;

use super::runner::SimConfig;
use crate::model::World;

/// Context handed to each turn phase and engine operation.
///
/// Bundled so phases share one signature and the RNG stays a single stream.
pub struct TickContext<'a> {
    pub world: &'a mut World,
    pub rng: &'a mut dyn RngCore,
    pub config: &'a SimConfig,
}
