use std::time::Duration;

use tracing::{debug, info, warn};

use super::{CancelToken, Engine};
use crate::model::{MacroConfig, MacroValue};
use crate::transport::MemoryTransport;

/// Execute the steps of `config` in order until done or cancelled.
pub(super) fn run<T: MemoryTransport + 'static>(
    engine: &Engine<T>,
    config: &MacroConfig,
    cancel: &CancelToken,
) {
    info!("Macro '{}' started ({} steps)", config.id, config.steps.len());

    for (index, step) in config.steps.iter().enumerate() {
        if let Some(delay) = step.delay_ms
            && cancel.wait(Duration::from_millis(delay))
        {
            info!("Macro '{}' cancelled at step {}", config.id, index + 1);
            return;
        }
        if cancel.is_cancelled() {
            info!("Macro '{}' cancelled at step {}", config.id, index + 1);
            return;
        }

        let Some((target, source)) = step.write_target() else {
            if step.target_var_id.is_some() {
                warn!("Macro '{}' step {}: unusable value", config.id, index + 1);
            }
            continue;
        };

        let value = match source {
            MacroValue::Literal(value) => value,
            MacroValue::Reference(id) => {
                let raw = engine.snapshot().raw.get(id).copied().unwrap_or_default();
                // Wrap rather than saturate so u32 sources keep their bit pattern
                raw as i64 as i32
            }
        };
        debug!("Macro '{}' step {}: {} = {}", config.id, index + 1, target, value);
        engine.write_variable(target, value);
    }

    info!("Macro '{}' finished", config.id);
}
