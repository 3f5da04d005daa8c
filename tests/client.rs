#![cfg(feature = "host")]
#![allow(missing_docs)]
//! Host-level tests for the client handle and its key bindings.

mod support;

use embassy_futures::block_on;
use servo_envoy::channel::DISABLED_ANGLE;
use servo_envoy::client::{Action, Key, MAX_NAME_LEN, ServoClient};
use servo_envoy::config::ServoConfig;
use servo_envoy::dispatch::{LocalTransport, ServoFile, Session, Transport};
use servo_envoy::registry::ChannelRegistry;
use servo_envoy::{Errno, Error};
use support::{MockPwm, Probe, mock};

type LocalClient<'r> = ServoClient<Session<'r, MockPwm, 2>>;

fn registry_with_channel_zero() -> (ChannelRegistry<MockPwm, 2>, Probe) {
    let registry = ChannelRegistry::new(ServoConfig::DEFAULT);
    let (pwm, probe) = mock();
    block_on(registry.attach(0, |_| Ok(pwm))).expect("attach channel 0");
    (registry, probe)
}

#[test]
fn create_validates_name_only() {
    assert!(matches!(LocalClient::create(""), Err(Error::InvalidArgument)));

    // Over-long names are kept up to the limit, never rejected.
    let long = format!("/dev/{}0", "x".repeat(70));
    let client = LocalClient::create(&long).expect("create long name");
    assert_eq!(client.name().len(), MAX_NAME_LEN);
    assert_eq!(client.name(), &long[..MAX_NAME_LEN]);

    // A multi-byte character straddling the limit is dropped whole.
    let accented = format!("{}é", "x".repeat(MAX_NAME_LEN - 1));
    let client = LocalClient::create(&accented).expect("create accented name");
    assert_eq!(client.name(), "x".repeat(MAX_NAME_LEN - 1));

    // No resource is touched, so a name that will never open is still accepted here.
    let client = LocalClient::create("/dev/servo_missing").expect("create");
    assert_eq!(client.name(), "/dev/servo_missing");
    assert!(!client.is_initialized());
}

#[test]
fn operations_before_init_are_rejected() {
    block_on(async {
        let mut client = LocalClient::create("/dev/servo0").expect("create");
        assert_eq!(client.enable().await, Err(Error::NotInitialized));
        assert_eq!(client.disable().await, Err(Error::NotInitialized));
        assert_eq!(client.set_position(90).await, Err(Error::NotInitialized));
        assert_eq!(client.get_position().await, Err(Error::NotInitialized));
        assert_eq!(client.close(), Ok(()));
    });
}

#[test]
fn init_failure_leaves_client_uninitialized() {
    block_on(async {
        let (registry, _probe) = registry_with_channel_zero();
        let transport = LocalTransport::new(&registry);

        let mut client = LocalClient::create("/dev/servo_driver").expect("create");
        assert_eq!(client.init(&transport).await, Err(Error::InvalidArgument));
        assert!(!client.is_initialized());
        assert_eq!(client.enable().await, Err(Error::NotInitialized));
    });
}

#[test]
fn full_session_drives_channel() {
    block_on(async {
        let (registry, probe) = registry_with_channel_zero();
        let transport = LocalTransport::new(&registry);
        let mut client = LocalClient::create("/dev/servo0").expect("create");
        client.init(&transport).await.expect("init");
        assert!(client.is_initialized());

        client.set_position(45).await.expect("set_position");
        assert_eq!(probe.state().duty_cycle_ns, 950_000);
        assert_eq!(client.get_position().await, Ok(DISABLED_ANGLE));

        client.enable().await.expect("enable");
        assert!(probe.state().enabled);
        assert_eq!(client.get_position().await, Ok(45));
        // Every call reports the current value, not an empty one-shot read.
        assert_eq!(client.get_position().await, Ok(45));

        client.set_position(180).await.expect("set_position");
        assert_eq!(client.get_position().await, Ok(180));

        client.disable().await.expect("disable");
        assert!(!probe.state().enabled);
        assert_eq!(client.get_position().await, Ok(DISABLED_ANGLE));

        client.close().expect("close");
        // Closing the handle leaves the channel attached.
        assert!(registry.is_attached(0).await);
    });
}

#[test]
fn out_of_range_position_is_rejected() {
    block_on(async {
        let (registry, probe) = registry_with_channel_zero();
        let transport = LocalTransport::new(&registry);
        let mut client = LocalClient::create("/dev/servo0").expect("create");
        client.init(&transport).await.expect("init");
        client.set_position(100).await.expect("set_position");

        assert_eq!(client.set_position(200).await, Err(Error::InvalidArgument));
        assert_eq!(client.set_position(-5).await, Err(Error::InvalidArgument));
        assert_eq!(probe.state().duty_cycle_ns, 1_500_000);
    });
}

#[test]
fn unattached_channel_is_retryable() {
    block_on(async {
        let (registry, _probe) = registry_with_channel_zero();
        let transport = LocalTransport::new(&registry);
        let mut client = LocalClient::create("/dev/servo1").expect("create");
        client.init(&transport).await.expect("init");

        assert_eq!(client.enable().await, Err(Error::BackendUnavailable));
        let (pwm, _late_probe) = mock();
        registry.attach(1, |_| Ok(pwm)).await.expect("late attach");
        assert_eq!(client.enable().await, Ok(()));
    });
}

#[test]
fn key_bindings() {
    assert_eq!(Key::Up.action(), Action::Enable);
    assert_eq!(Key::Down.action(), Action::Disable);
    assert_eq!(Key::Right.action(), Action::SetPosition(0));
    assert_eq!(Key::Left.action(), Action::SetPosition(180));
    assert_eq!(Key::Char(b'q').action(), Action::Quit);
    assert_eq!(Key::Char(b'Q').action(), Action::Quit);
    assert_eq!(Key::Char(b'x').action(), Action::Ignore);
    assert_eq!(Key::Char(0x1b).action(), Action::Ignore);
}

#[test]
fn apply_follows_key_bindings() {
    block_on(async {
        let (registry, probe) = registry_with_channel_zero();
        let transport = LocalTransport::new(&registry);
        let mut client = LocalClient::create("/dev/servo0").expect("create");
        client.init(&transport).await.expect("init");

        client.apply(Key::Up.action()).await.expect("up");
        assert!(probe.state().enabled);
        client.apply(Key::Left.action()).await.expect("left");
        assert_eq!(client.get_position().await, Ok(180));
        client.apply(Key::Right.action()).await.expect("right");
        assert_eq!(client.get_position().await, Ok(0));

        let configures = probe.state().configure_calls;
        client.apply(Key::Char(b'z').action()).await.expect("ignore");
        client.apply(Key::Char(b'q').action()).await.expect("quit");
        assert_eq!(probe.state().configure_calls, configures);
        assert!(probe.state().enabled);

        client.apply(Key::Down.action()).await.expect("down");
        assert!(!probe.state().enabled);
    });
}

// ============================================================================
// A scripted transport for replies a local session never produces
// ============================================================================

struct ScriptedFile {
    reply: &'static [u8],
    close_error: Option<Errno>,
}

impl ServoFile for ScriptedFile {
    async fn read(&mut self, buffer: &mut [u8]) -> Result<usize, Errno> {
        let mut len = 0;
        for (target, source) in buffer.iter_mut().zip(self.reply) {
            *target = *source;
            len += 1;
        }
        Ok(len)
    }

    async fn write(&mut self, bytes: &[u8]) -> Result<usize, Errno> {
        Ok(bytes.len())
    }

    async fn control(&mut self, _code: u32) -> Result<(), Errno> {
        Err(Errno(95))
    }

    fn rewind(&mut self) {}

    fn close(self) -> Result<(), Errno> {
        self.close_error.map_or(Ok(()), Err)
    }
}

struct ScriptedTransport {
    reply: &'static [u8],
    close_error: Option<Errno>,
}

impl Transport for ScriptedTransport {
    type File = ScriptedFile;

    async fn open(&self, _name: &str) -> Result<ScriptedFile, Errno> {
        Ok(ScriptedFile {
            reply: self.reply,
            close_error: self.close_error,
        })
    }
}

#[test]
fn garbled_reply_is_an_io_failure() {
    block_on(async {
        let transport = ScriptedTransport {
            reply: b"ninety\n",
            close_error: None,
        };
        let mut client = ServoClient::create("/dev/servo0").expect("create");
        client.init(&transport).await.expect("init");
        assert_eq!(client.get_position().await, Err(Error::IoFailure));
        // Codes without a dedicated variant also come back as I/O failures.
        assert_eq!(client.enable().await, Err(Error::IoFailure));
    });
}

#[test]
fn close_reports_transport_failure() {
    block_on(async {
        let transport = ScriptedTransport {
            reply: b"12\n",
            close_error: Some(Errno::ENODEV),
        };
        let mut client = ServoClient::create("/dev/servo0").expect("create");
        client.init(&transport).await.expect("init");
        assert_eq!(client.get_position().await, Ok(12));
        assert_eq!(client.close(), Err(Error::Fatal));
    });
}
