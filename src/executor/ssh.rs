//! Direct secure-shell command executor.
//!
//! One session per device, never pooled or reused across devices in the same
//! job: one device's authentication or protocol failure must not affect a
//! sibling. Captured output is bounded so a misbehaving device cannot
//! exhaust memory.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use russh::client;
use russh::{ChannelMsg, Disconnect};

use crate::config::{Credentials, SshConfig};
use crate::error::ErrorKind;
use crate::executor::DeviceExecutor;
use crate::inventory::Device;
use crate::job::DeviceResult;

pub const TRUNCATION_MARKER: &str = "[output truncated]";

/// Accepts any host key. Device host keys churn in lab inventories and the
/// credential boundary is the password, as in the original deployment.
struct AcceptAllKeys;

#[async_trait]
impl client::Handler for AcceptAllKeys {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        _server_public_key: &russh_keys::key::PublicKey,
    ) -> Result<bool, Self::Error> {
        Ok(true)
    }
}

/// Output sink with a hard byte cap and an explicit truncation marker.
struct BoundedBuf {
    bytes: Vec<u8>,
    max: usize,
    truncated: bool,
}

impl BoundedBuf {
    fn new(max: usize) -> Self {
        Self {
            bytes: Vec::new(),
            max,
            truncated: false,
        }
    }

    fn push(&mut self, data: &[u8]) {
        if self.truncated {
            return;
        }
        let room = self.max.saturating_sub(self.bytes.len());
        if data.len() > room {
            self.bytes.extend_from_slice(&data[..room]);
            self.truncated = true;
        } else {
            self.bytes.extend_from_slice(data);
        }
    }

    fn push_str(&mut self, text: &str) {
        self.push(text.as_bytes());
    }

    fn finish(self) -> String {
        let mut out = String::from_utf8_lossy(&self.bytes).into_owned();
        if self.truncated {
            out.push('\n');
            out.push_str(TRUNCATION_MARKER);
        }
        out
    }
}

pub struct SshExecutor {
    config: SshConfig,
    credentials: BTreeMap<String, Credentials>,
}

impl SshExecutor {
    pub fn new(config: SshConfig, credentials: BTreeMap<String, Credentials>) -> Self {
        Self {
            config,
            credentials,
        }
    }

    async fn run(&self, device: &Device, commands: &[String], started: Instant) -> DeviceResult {
        let Some(creds) = self.credentials.get(&device.credential_ref) else {
            return DeviceResult::failure(
                &device.id,
                started.elapsed().as_millis() as u64,
                ErrorKind::AuthenticationFailure,
                format!("unknown credential reference: {}", device.credential_ref),
            );
        };

        let ssh_config = Arc::new(client::Config::default());
        let connect = tokio::time::timeout(
            self.config.connect_timeout,
            client::connect(
                ssh_config,
                (device.address.as_str(), device.port),
                AcceptAllKeys,
            ),
        )
        .await;

        let mut session = match connect {
            Ok(Ok(session)) => session,
            Ok(Err(e)) => {
                return DeviceResult::failure(
                    &device.id,
                    started.elapsed().as_millis() as u64,
                    ErrorKind::ConnectivityFailure,
                    format!("connect failed: {}", e),
                )
            }
            Err(_) => {
                return DeviceResult::failure(
                    &device.id,
                    started.elapsed().as_millis() as u64,
                    ErrorKind::ConnectivityFailure,
                    format!("connect timed out after {:?}", self.config.connect_timeout),
                )
            }
        };

        match session
            .authenticate_password(creds.username.as_str(), creds.password.as_str())
            .await
        {
            Ok(true) => {}
            Ok(false) => {
                return DeviceResult::failure(
                    &device.id,
                    started.elapsed().as_millis() as u64,
                    ErrorKind::AuthenticationFailure,
                    format!("authentication rejected for user {}", creds.username),
                )
            }
            Err(e) => {
                return DeviceResult::failure(
                    &device.id,
                    started.elapsed().as_millis() as u64,
                    ErrorKind::ConnectivityFailure,
                    format!("authentication transport error: {}", e),
                )
            }
        }

        let mut output = BoundedBuf::new(self.config.max_output_bytes);
        for command in commands {
            output.push_str(&format!("$ {}\n", command));
            match self.run_command(&mut session, command, &mut output).await {
                Ok(0) => {}
                Ok(code) => {
                    let _ = session
                        .disconnect(Disconnect::ByApplication, "", "en")
                        .await;
                    // The device accepted the session but refused this
                    // command; remaining commands are not attempted.
                    return DeviceResult::failure(
                        &device.id,
                        started.elapsed().as_millis() as u64,
                        ErrorKind::CommandRejected,
                        {
                            let mut text = output.finish();
                            text.push_str(&format!("\ncommand exited with status {}", code));
                            text
                        },
                    );
                }
                Err(e) => {
                    return DeviceResult::failure(
                        &device.id,
                        started.elapsed().as_millis() as u64,
                        ErrorKind::ConnectivityFailure,
                        format!("session error while running '{}': {}", command, e),
                    )
                }
            }
        }

        let _ = session
            .disconnect(Disconnect::ByApplication, "", "en")
            .await;
        DeviceResult::success(
            &device.id,
            started.elapsed().as_millis() as u64,
            output.finish(),
        )
    }

    async fn run_command(
        &self,
        session: &mut client::Handle<AcceptAllKeys>,
        command: &str,
        output: &mut BoundedBuf,
    ) -> Result<u32, russh::Error> {
        let mut channel = session.channel_open_session().await?;
        channel.exec(true, command).await?;

        let mut exit_status = 0u32;
        while let Some(msg) = channel.wait().await {
            match msg {
                ChannelMsg::Data { ref data } => output.push(data),
                ChannelMsg::ExtendedData { ref data, .. } => output.push(data),
                ChannelMsg::ExitStatus { exit_status: code } => exit_status = code,
                _ => {}
            }
        }
        Ok(exit_status)
    }
}

#[async_trait]
impl DeviceExecutor for SshExecutor {
    async fn execute(
        &self,
        device: &Device,
        commands: &[String],
        timeout: Duration,
    ) -> DeviceResult {
        let started = Instant::now();
        match tokio::time::timeout(timeout, self.run(device, commands, started)).await {
            Ok(result) => result,
            Err(_) => {
                // Dropping the in-flight future tears the session down; the
                // command may still be applying on the device, which is
                // exactly what the timeout outcome communicates.
                tracing::warn!(device = %device.id, ?timeout, "device execution timed out");
                DeviceResult::timeout(&device.id, timeout.as_millis() as u64)
            }
        }
    }
}
