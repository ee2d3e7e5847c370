use super::*;

impl ShellSession {
    /// Opens an SSH session to `device` and waits for the first prompt.
    ///
    /// The connect timeout bounds the whole establishment phase: TCP, key
    /// exchange, authentication and the initial prompt wait. Banner and MOTD
    /// output ahead of the prompt is discarded.
    pub async fn connect(
        device: &DeviceDescriptor,
        credentials: &Credentials,
        dialect: &'static IosDialect,
        connect_timeout: Duration,
        exec_timeout: Duration,
    ) -> Result<Self, SessionError> {
        let endpoint = format!("{}:{}", device.host, device.port);

        let ssh_config = Config {
            preferred: config::device_preferred(),
            inactivity_timeout: Some(Duration::from_secs(60)),
            ..Default::default()
        };

        let connecting = Client::connect_with_config(
            (device.host.clone(), device.port),
            &credentials.username,
            AuthMethod::with_password(credentials.password()),
            ServerCheckMethod::NoCheck,
            ssh_config,
        );
        let client = match tokio::time::timeout(connect_timeout, connecting).await {
            Ok(connected) => connected?,
            Err(_) => return Err(SessionError::ConnectTimeout(connect_timeout)),
        };
        debug!("{} transport established", endpoint);

        let mut channel = client.get_channel().await?;
        channel
            .request_pty(false, "xterm", 800, 600, 0, 0, &[])
            .await?;
        channel.request_shell(false).await?;
        debug!("{} shell request successful", endpoint);

        let (to_shell, mut shell_input) = mpsc::channel::<String>(256);
        let (shell_output, from_shell) = mpsc::channel::<String>(256);

        let io_endpoint = endpoint.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    Some(data) = shell_input.recv() => {
                        if let Err(e) = channel.data(data.as_bytes()).await {
                            debug!("{} failed to send data to shell: {:?}", io_endpoint, e);
                            break;
                        }
                    },
                    Some(msg) = channel.wait() => {
                        match msg {
                            ChannelMsg::Data { ref data } => {
                                if let Ok(text) = std::str::from_utf8(data)
                                    && shell_output.send(text.to_string()).await.is_err() {
                                        debug!("{} shell output receiver dropped", io_endpoint);
                                        break;
                                    }
                            }
                            ChannelMsg::ExitStatus { exit_status } => {
                                debug!("{} shell exited with status {}", io_endpoint, exit_status);
                                let _ = channel.eof().await;
                                break;
                            }
                            ChannelMsg::Eof => {
                                debug!("{} shell sent EOF", io_endpoint);
                                break;
                            }
                            _ => {}
                        }
                    },
                    else => break,
                }
            }
            debug!("{} shell I/O task ended", io_endpoint);
        });

        let mut session = Self {
            client,
            to_shell,
            from_shell,
            dialect,
            prompt: String::new(),
            hostname: String::new(),
            exec_timeout,
        };

        let mut banner = String::new();
        let prompt = session.wait_for_prompt(connect_timeout, &mut banner).await?;
        session.hostname = dialect
            .hostname(&prompt)
            .unwrap_or_else(|| device.host.clone());
        session.prompt = prompt;
        debug!(
            "{} [{}] prompt detected: {}",
            endpoint,
            dialect.name(),
            session.prompt
        );

        // Pagination would stall every batched read mid-output.
        session.exec(dialect.pagination_off_command()).await?;

        Ok(session)
    }

    /// Hostname negotiated from the initial prompt.
    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// Checks whether the underlying SSH connection is still active.
    pub fn is_connected(&self) -> bool {
        !self.client.is_closed()
    }

    /// Executes one command and waits for the next prompt.
    ///
    /// Returns the raw exchange: echoed command, output and trailing
    /// prompt. Device error lines are logged but do not fail the call.
    pub async fn exec(&mut self, command: &str) -> Result<String, SessionError> {
        self.drain_residual();
        self.to_shell.send(format!("{command}\n")).await?;

        let mut output = String::new();
        let timeout = self.exec_timeout;
        match self.wait_for_prompt(timeout, &mut output).await {
            Ok(prompt) => self.prompt = prompt,
            Err(SessionError::PromptTimeout) => {
                return Err(SessionError::ExecTimeout(command.to_string()));
            }
            Err(err) => return Err(err),
        }

        for line in output.lines() {
            if self.dialect.is_error_line(line) {
                warn!("{}: device reported: {}", self.hostname, line.trim());
            }
        }

        Ok(output)
    }

    /// Applies the whole command batch in one configuration-mode pass.
    ///
    /// Enters configuration mode, sends every command in order, leaves with
    /// the dialect's exit command, and returns the combined transcript.
    pub async fn run_config_set(&mut self, commands: &[String]) -> Result<String, SessionError> {
        let mut transcript = String::new();
        transcript.push_str(&self.exec(self.dialect.config_enter_command()).await?);
        for command in commands {
            transcript.push_str(&self.exec(command).await?);
        }
        transcript.push_str(&self.exec(self.dialect.config_exit_command()).await?);
        Ok(transcript)
    }

    /// Saves running configuration to startup configuration.
    ///
    /// The save dialogue may pause on confirmation prompts that arrive
    /// without a newline; each recognized one is acknowledged with the
    /// dialect's reply until the prompt returns.
    pub async fn save_running_config(&mut self) -> Result<String, SessionError> {
        self.drain_residual();
        let save_command = self.dialect.save_command();
        self.to_shell.send(format!("{save_command}\n")).await?;

        let mut output = String::new();
        let mut buffer = String::new();
        let timeout = self.exec_timeout;
        let result = tokio::time::timeout(timeout, async {
            loop {
                match self.from_shell.recv().await {
                    Some(data) => {
                        trace!("{:?}", data);
                        buffer.push_str(&data);
                        while let Some(pos) = buffer.find('\n') {
                            let line: String = buffer.drain(..=pos).collect();
                            output.push_str(&line);
                        }
                        if buffer.is_empty() {
                            continue;
                        }
                        if let Some(reply) = self.dialect.save_reply(&buffer) {
                            output.push_str(&buffer);
                            output.push('\n');
                            buffer.clear();
                            self.to_shell.send(reply.to_string()).await?;
                        } else if self.dialect.is_prompt(&buffer) {
                            output.push_str(&buffer);
                            self.prompt = buffer.trim().to_string();
                            return Ok(());
                        }
                    }
                    None => return Err(SessionError::ChannelClosed),
                }
            }
        })
        .await;

        match result {
            Ok(Ok(())) => Ok(output),
            Ok(Err(err)) => Err(err),
            Err(_) => Err(SessionError::ExecTimeout(save_command.to_string())),
        }
    }

    /// Closes the session, attempting a graceful shell exit first.
    pub async fn close(&mut self) {
        self.from_shell.close();

        if self.is_connected() {
            if let Err(e) = self.to_shell.send("exit\n".to_string()).await {
                debug!("failed to send exit command: {:?}", e);
            }
            // Give the device a moment to process the exit before the
            // transport drops.
            tokio::time::sleep(Duration::from_millis(100)).await;
        }

        debug!("{} session closed", self.hostname);
    }

    /// Reads shell output until the trailing partial line is a prompt.
    ///
    /// Complete lines are appended to `sink`; pagination prompts are
    /// acknowledged transparently. Returns the prompt text.
    async fn wait_for_prompt(
        &mut self,
        timeout: Duration,
        sink: &mut String,
    ) -> Result<String, SessionError> {
        let mut buffer = String::new();
        let result = tokio::time::timeout(timeout, async {
            loop {
                match self.from_shell.recv().await {
                    Some(data) => {
                        trace!("{:?}", data);
                        buffer.push_str(&data);

                        while let Some(pos) = buffer.find('\n') {
                            let line: String = buffer.drain(..=pos).collect();
                            sink.push_str(&line);
                        }

                        // The prompt never carries a newline; test the
                        // remaining partial line.
                        if buffer.is_empty() {
                            continue;
                        }
                        if self.dialect.is_prompt(&buffer) {
                            sink.push_str(&buffer);
                            return Ok(buffer.trim().to_string());
                        }
                        if self.dialect.wants_more(&buffer) {
                            sink.push_str(&buffer);
                            buffer.clear();
                            self.to_shell.send(" ".to_string()).await?;
                        }
                    }
                    None => return Err(SessionError::ChannelClosed),
                }
            }
        })
        .await;

        match result {
            Ok(inner) => inner,
            Err(_) => Err(SessionError::PromptTimeout),
        }
    }

    fn drain_residual(&mut self) {
        while self.from_shell.try_recv().is_ok() {}
    }
}
