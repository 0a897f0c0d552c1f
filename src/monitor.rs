//! Master Data Monitor
//!
//! Remote clients have no event telling them the master player's quest
//! progress moved, so they poll the master's persisted slots once a second
//! and let the owning controller resync when a value changes.

use std::collections::HashMap;

use tracing::debug;

use crate::controller::{ManagedController, OverlayCtx};
use crate::host::{GameSession, Host, ModData};

#[derive(Debug, Default)]
pub struct MasterDataMonitor {
    last_seen: HashMap<String, Option<String>>,
}

impl MasterDataMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    fn current(host: &dyn Host, key: &str) -> Option<String> {
        host.mod_data(host.master_player(), key)
    }

    /// Take the current values as the baseline. On the master game there is
    /// nothing to watch.
    pub fn prime(&mut self, host: &dyn Host, controllers: &[Box<dyn ManagedController>]) {
        self.last_seen.clear();
        if host.is_master_game() {
            return;
        }
        for controller in controllers {
            let key = controller.state_key().to_string();
            let value = Self::current(host, &key);
            self.last_seen.insert(key, value);
        }
    }

    /// One-second tick. Returns how many controllers were told to resync.
    pub fn poll(&mut self, ctx: &mut OverlayCtx<'_>, controllers: &mut [Box<dyn ManagedController>]) -> usize {
        if ctx.host.is_master_game() {
            self.last_seen.clear();
            return 0;
        }

        let mut changed = 0;
        for controller in controllers.iter_mut() {
            let value = Self::current(&*ctx.host, controller.state_key());
            let previous = self.last_seen.get(controller.state_key());
            if previous == Some(&value) {
                continue;
            }

            debug!("Master progress for {} changed to {:?}", controller.kind_id(), value);
            self.last_seen.insert(controller.state_key().to_string(), value);
            controller.on_master_state_changed(ctx);
            changed += 1;
        }
        changed
    }
}
