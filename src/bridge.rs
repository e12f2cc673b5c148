//! Wiring: one call that builds the mailbox, starts the poller and hands back
//! the realtime consumer.
//!
//! # Example
//!
//! ```ignore
//! use keygate::{bridge, config::BridgeConfig, input::keys::*, rt::{GateBank, KeyMap}};
//!
//! let map = KeyMap::new().bind(KEY_A, 0usize).bind(KEY_S, 1);
//! let (mut keys, poller) = bridge::start(&BridgeConfig::default(), map)?;
//! let mut gates = GateBank::new(2);
//!
//! // inside the audio callback, once per block:
//! keys.process(&mut gates);
//!
//! // on exit:
//! poller.shutdown();
//! ```

use crate::{
    config::BridgeConfig,
    error::InputError,
    input::{
        device::{DevicePath, SourceFactory},
        poller::{Poller, PollerHandle},
    },
    mailbox::Mailbox,
    rt::{KeyConsumer, KeyMap},
    shutdown::ShutdownToken,
};

/// Start reading `config.device` in the background.
///
/// The device is opened on the poller thread, so a missing device does not
/// fail here: the poller logs the failure, reports
/// [`DeviceStatus::Unavailable`](crate::input::poller::DeviceStatus), and the
/// consumer simply never sees a transition.
pub fn start<A>(
    config: &BridgeConfig,
    map: KeyMap<A>,
) -> Result<(KeyConsumer<A>, PollerHandle), InputError> {
    start_with(DevicePath(config.device.clone()), config, map)
}

/// Like [`start`], reading from any source factory.
pub fn start_with<A, F>(
    factory: F,
    config: &BridgeConfig,
    map: KeyMap<A>,
) -> Result<(KeyConsumer<A>, PollerHandle), InputError>
where
    F: SourceFactory + 'static,
{
    let (publisher, receiver) = Mailbox::new().split();
    let poller = Poller::new(factory, publisher, config, ShutdownToken::new());
    let (handle, rearm) = poller.spawn(config.schedule, &config.thread_name)?;

    Ok((KeyConsumer::new(receiver, map, rearm), handle))
}
