// Licensed under the Apache-2.0 license

mod test_recovery_flow;
mod test_recovery_wire;
mod test_threshold_triggers;
