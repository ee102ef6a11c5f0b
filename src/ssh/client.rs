// ABOUTME: SSH session management using russh.
// ABOUTME: The downstream step gated by the knock: connect, authenticate, run commands.

use super::error::{Error, Result};
use russh::client::{self, Config, Handle};
use russh::keys::agent::client::AgentClient;
use russh::keys::known_hosts::{check_known_hosts, learn_known_hosts};
use russh::keys::{PrivateKeyWithHashAlg, load_secret_key, ssh_key};
use russh::{ChannelMsg, Disconnect};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Configuration for establishing an SSH session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Remote host to connect to.
    pub host: String,
    /// SSH port (default: 22).
    pub port: u16,
    /// Username for authentication.
    pub user: String,
    /// Optional path to a private key file. When absent, the SSH agent is
    /// tried first, then the default key locations under ~/.ssh.
    pub key_path: Option<PathBuf>,
    /// Accept and record unknown host keys (Trust On First Use).
    pub trust_on_first_use: bool,
    /// Timeout for command execution.
    pub command_timeout: Duration,
}

impl SessionConfig {
    pub fn new(host: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: 22,
            user: user.into(),
            key_path: None,
            trust_on_first_use: false,
            command_timeout: Duration::from_secs(300),
        }
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn key_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.key_path = Some(path.into());
        self
    }

    pub fn trust_on_first_use(mut self, tofu: bool) -> Self {
        self.trust_on_first_use = tofu;
        self
    }

    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }
}

/// Output from a remote command execution.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub exit_code: u32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Host key verification against the default known_hosts file.
struct HostKeyCheck {
    host: String,
    port: u16,
    trust_on_first_use: bool,
}

impl client::Handler for HostKeyCheck {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &ssh_key::PublicKey,
    ) -> std::result::Result<bool, Self::Error> {
        match check_known_hosts(&self.host, self.port, server_public_key) {
            Ok(true) => Ok(true),
            Err(russh::keys::Error::KeyChanged { .. }) => Ok(false),
            _ if !self.trust_on_first_use => Ok(false),
            _ => {
                tracing::warn!(
                    host = %self.host,
                    port = self.port,
                    "trust-on-first-use: accepting unknown host key"
                );
                if let Err(e) = learn_known_hosts(&self.host, self.port, server_public_key) {
                    tracing::warn!("failed to record host key in known_hosts: {}", e);
                }
                Ok(true)
            }
        }
    }
}

/// An established SSH session.
pub struct Session {
    config: SessionConfig,
    handle: Handle<HostKeyCheck>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("config", &self.config)
            .field("handle", &"<russh::Handle>")
            .finish()
    }
}

impl Session {
    /// Connect to the remote host and authenticate.
    pub async fn connect(config: SessionConfig) -> Result<Self> {
        let russh_config = Config {
            inactivity_timeout: Some(Duration::from_secs(30)),
            ..Default::default()
        };

        let handler = HostKeyCheck {
            host: config.host.clone(),
            port: config.port,
            trust_on_first_use: config.trust_on_first_use,
        };

        let mut handle = client::connect(
            Arc::new(russh_config),
            (config.host.as_str(), config.port),
            handler,
        )
        .await
        .map_err(|e| Error::Connection(e.to_string()))?;

        if !Self::authenticate(&mut handle, &config).await? {
            return Err(Error::AuthenticationFailed);
        }

        Ok(Self { config, handle })
    }

    /// Try an explicit key, then the agent, then default key locations.
    async fn authenticate(handle: &mut Handle<HostKeyCheck>, config: &SessionConfig) -> Result<bool> {
        if let Some(key_path) = &config.key_path {
            let key = load_secret_key(key_path, None).map_err(|e| Error::KeyLoadFailed {
                path: key_path.clone(),
                reason: e.to_string(),
            })?;
            return Self::authenticate_with_key(handle, config, Arc::new(key)).await;
        }

        if let Ok(mut agent) = AgentClient::connect_env().await {
            if let Ok(keys) = agent.request_identities().await {
                for key in &keys {
                    if let Ok(result) = handle
                        .authenticate_publickey_with(&config.user, key.clone(), None, &mut agent)
                        .await
                    {
                        if result.success() {
                            return Ok(true);
                        }
                    }
                }
            }
        }

        let home = std::env::var("HOME").map_err(|_| {
            Error::NoCredentials("SSH agent not available and HOME not set".to_string())
        })?;
        for name in ["id_ed25519", "id_rsa", "id_ecdsa"] {
            let path = format!("{}/.ssh/{}", home, name);
            if let Ok(key) = load_secret_key(&path, None) {
                return Self::authenticate_with_key(handle, config, Arc::new(key)).await;
            }
        }

        Err(Error::NoCredentials(
            "SSH agent not available and no default keys found".to_string(),
        ))
    }

    async fn authenticate_with_key(
        handle: &mut Handle<HostKeyCheck>,
        config: &SessionConfig,
        key: Arc<ssh_key::PrivateKey>,
    ) -> Result<bool> {
        let hash_alg = handle
            .best_supported_rsa_hash()
            .await
            .map_err(Error::Protocol)?
            .flatten();

        let result = handle
            .authenticate_publickey(&config.user, PrivateKeyWithHashAlg::new(key, hash_alg))
            .await
            .map_err(Error::Protocol)?;

        Ok(result.success())
    }

    /// Execute a command on the remote host with the configured timeout.
    pub async fn exec(&self, command: &str) -> Result<CommandOutput> {
        self.exec_with_timeout(command, self.config.command_timeout)
            .await
    }

    /// Execute a command with a custom timeout.
    pub async fn exec_with_timeout(
        &self,
        command: &str,
        timeout: Duration,
    ) -> Result<CommandOutput> {
        match tokio::time::timeout(timeout, self.exec_inner(command)).await {
            Ok(result) => result,
            Err(_) => Err(Error::CommandTimeout(timeout)),
        }
    }

    async fn exec_inner(&self, command: &str) -> Result<CommandOutput> {
        let mut channel = self
            .handle
            .channel_open_session()
            .await
            .map_err(|e| Error::CommandFailed(format!("failed to open channel: {}", e)))?;

        channel
            .exec(true, command)
            .await
            .map_err(|e| Error::CommandFailed(format!("failed to exec command: {}", e)))?;

        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let mut exit_code = None;
        let mut got_eof = false;

        loop {
            match channel.wait().await {
                Some(ChannelMsg::Data { data }) => stdout.extend_from_slice(&data),
                Some(ChannelMsg::ExtendedData { data, ext }) if ext == 1 => {
                    stderr.extend_from_slice(&data);
                }
                Some(ChannelMsg::ExitStatus { exit_status }) => {
                    exit_code = Some(exit_status);
                    if got_eof {
                        break;
                    }
                }
                Some(ChannelMsg::Eof) => {
                    got_eof = true;
                    if exit_code.is_some() {
                        break;
                    }
                }
                Some(ChannelMsg::Close) | None => break,
                Some(_) => {}
            }
        }

        // A channel that closes without an exit status indicates abnormal
        // termination (connection drop, remote crash).
        let exit_code = exit_code.ok_or(Error::ChannelClosed)?;

        Ok(CommandOutput {
            exit_code,
            stdout: String::from_utf8_lossy(&stdout).to_string(),
            stderr: String::from_utf8_lossy(&stderr).to_string(),
        })
    }

    /// Disconnect the session.
    pub async fn disconnect(self) -> Result<()> {
        self.handle
            .disconnect(Disconnect::ByApplication, "", "en")
            .await
            .map_err(Error::Protocol)?;
        Ok(())
    }
}
