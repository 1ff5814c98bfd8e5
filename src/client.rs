//! MPD Client
//!
//! Owns the single active transport and all protocol sequencing state:
//! the pending queue for deferred send/fetch, the command-list batch,
//! and the iterating flag for lazy decoding. One connection, one
//! in-flight logical operation at a time; the client is not safe for
//! concurrent use without external serialization.

use std::collections::VecDeque;
use std::os::unix::io::{AsRawFd, RawFd};
use std::time::Duration;

use crate::config::Config;
use crate::error::{MpdError, Result};
use crate::network::{LineTransport, StreamTransport};
use crate::protocol::{
    decode, encode_command, read_response_pair, resolve, Arg, BinaryChunk, Object, ObjectSplitter,
    Range, Reply, ResponseKind, Terminator, HELLO_PREFIX,
};

/// Blocking client for the MPD protocol.
///
/// Generic over the transport so decoders can be exercised against
/// scripted streams; normal use goes through [`MpdClient::connect`]
/// with the default [`StreamTransport`].
///
/// # Example
///
/// ```no_run
/// use mpdlink::MpdClient;
///
/// let mut client = MpdClient::new();
/// client.connect()?;
/// let status = client.status()?;
/// println!("state: {:?}", status.get("state"));
/// client.disconnect();
/// # Ok::<(), mpdlink::MpdError>(())
/// ```
#[derive(Debug)]
pub struct MpdClient<T: LineTransport = StreamTransport> {
    /// Connection settings
    config: Config,

    /// Active transport, `None` while disconnected
    transport: Option<T>,

    /// Protocol version from the handshake line.
    ///
    /// This is the version of the protocol spoken, not the version of
    /// the daemon itself.
    version: Option<String>,

    /// Commands sent but not yet fetched, in wire order
    pending: VecDeque<String>,

    /// Decoders captured while a command-list batch is open
    command_list: Option<Vec<ResponseKind>>,

    /// Whether a lazy response sequence is currently live
    iterating: bool,
}

impl Default for MpdClient<StreamTransport> {
    fn default() -> Self {
        Self::new()
    }
}

impl MpdClient<StreamTransport> {
    /// Create a client configured from the MPD environment variables
    pub fn new() -> Self {
        Self::with_config(Config::from_env())
    }

    /// Create a client with an explicit configuration
    pub fn with_config(config: Config) -> Self {
        Self {
            config,
            transport: None,
            version: None,
            pending: VecDeque::new(),
            command_list: None,
            iterating: false,
        }
    }

    /// Connect to the configured host and perform the handshake.
    ///
    /// A host starting with `/` or `@` selects the Unix-domain
    /// transport (the port is ignored); anything else is TCP. The
    /// handshake read runs under the connection timeout; the
    /// per-operation socket timeout is applied afterwards. Any failure
    /// tears the transport back down before propagating.
    pub fn connect(&mut self) -> Result<()> {
        if self.transport.is_some() {
            return Err(MpdError::Connection("already connected".to_string()));
        }

        let host = self.config.host.clone();
        let timeout = self.config.connection_timeout;
        let mut transport = if host.starts_with('/') || host.starts_with('@') {
            tracing::debug!("connecting to unix socket {}", host);
            StreamTransport::connect_unix(&host)?
        } else {
            tracing::debug!(
                "connecting to {}:{} (timeout: {:?})",
                host,
                self.config.port,
                timeout
            );
            StreamTransport::connect_tcp(&host, self.config.port, timeout)?
        };

        // Handshake under the connection timeout; dropping the
        // transport on error closes the socket.
        transport.set_timeout(Some(timeout))?;
        let version = handshake(&mut transport)?;
        transport.set_timeout(self.config.socket_timeout)?;

        tracing::debug!("connected, protocol version {}", version);
        self.transport = Some(transport);
        self.version = Some(version);
        Ok(())
    }

    /// Override host and port, then connect
    pub fn connect_to(&mut self, host: impl Into<String>, port: u16) -> Result<()> {
        self.config.host = host.into();
        self.config.port = port;
        self.connect()
    }

    /// Set the per-operation socket timeout (`None` disables it).
    ///
    /// Applied immediately when connected. A zero duration is
    /// rejected.
    pub fn set_socket_timeout(&mut self, timeout: Option<Duration>) -> Result<()> {
        if timeout.is_some_and(|t| t.is_zero()) {
            return Err(MpdError::Config(
                "socket timeout expects a non-zero duration".to_string(),
            ));
        }
        self.config.socket_timeout = timeout;
        if let Some(transport) = self.transport.as_mut() {
            transport.set_timeout(timeout)?;
        }
        Ok(())
    }

    /// Raw descriptor of the connected socket, `None` while
    /// disconnected.
    ///
    /// For callers multiplexing readiness externally: after
    /// [`send_idle`](Self::send_idle), poll this descriptor and only
    /// call [`fetch_idle`](Self::fetch_idle) once data is known to be
    /// available.
    pub fn as_raw_fd(&self) -> Option<RawFd> {
        self.transport.as_ref().map(AsRawFd::as_raw_fd)
    }
}

impl<T: LineTransport> MpdClient<T> {
    /// Build a client from an already-connected transport, performing
    /// the handshake on it.
    ///
    /// Useful for custom transports and for driving the protocol
    /// against scripted streams in tests.
    pub fn with_transport(mut transport: T, config: Config) -> Result<Self> {
        let version = handshake(&mut transport)?;
        Ok(Self {
            config,
            transport: Some(transport),
            version: Some(version),
            pending: VecDeque::new(),
            command_list: None,
            iterating: false,
        })
    }

    /// The protocol version negotiated during the handshake
    pub fn protocol_version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn is_connected(&self) -> bool {
        self.transport.is_some()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Close the connection and reset all protocol state.
    ///
    /// Closes the socket directly rather than sending the protocol's
    /// `close` command. Tolerates an already-closed transport.
    pub fn disconnect(&mut self) {
        tracing::debug!("disconnecting");
        self.reset();
    }

    /// Drop the transport and clear every piece of protocol state
    /// atomically: pending queue, batch, iterating flag, version.
    fn reset(&mut self) {
        if let Some(mut transport) = self.transport.take() {
            transport.close();
        }
        self.version = None;
        self.pending.clear();
        self.command_list = None;
        self.iterating = false;
    }

    /// Tear the connection down if the error is fatal, then pass it on
    fn fail(&mut self, err: MpdError) -> MpdError {
        if err.is_fatal() {
            tracing::warn!("fatal error, resetting connection: {}", err);
            self.reset();
        }
        err
    }

    fn settle<R>(&mut self, result: Result<R>) -> Result<R> {
        result.map_err(|e| self.fail(e))
    }

    fn write_command(&mut self, name: &str, args: &[Arg]) -> Result<()> {
        // Argument validation happens before anything touches the wire
        let line = encode_command(name, args)?;
        let transport = self
            .transport
            .as_mut()
            .ok_or_else(|| MpdError::Connection("not connected".to_string()))?;
        let result = transport.write_line(&line);
        self.settle(result)
    }

    fn read_reply(&mut self, kind: ResponseKind, mode: Terminator) -> Result<Reply> {
        let transport = self
            .transport
            .as_mut()
            .ok_or_else(|| MpdError::Connection("not connected".to_string()))?;
        let result = decode(transport, kind, mode);
        self.settle(result)
    }

    fn read_pair_for_iter(&mut self, separator: &'static str) -> Result<Option<(String, String)>> {
        let transport = self
            .transport
            .as_mut()
            .ok_or_else(|| MpdError::Connection("not connected".to_string()))?;
        let result = read_response_pair(transport, separator, Terminator::Single);
        self.settle(result)
    }

    // -------------------------------------------------------------------------
    // Dispatch: the three calling conventions
    // -------------------------------------------------------------------------

    /// Execute a command immediately and decode its response.
    ///
    /// Inside an open command list the decoder is captured for replay
    /// instead and `Reply::None` is returned. Rejected while a lazy
    /// sequence is live or deferred commands are pending.
    pub fn execute(&mut self, command: &str, args: &[Arg]) -> Result<Reply> {
        if self.iterating {
            return Err(MpdError::Iterating(format!(
                "cannot execute '{command}' while iterating"
            )));
        }
        if !self.pending.is_empty() {
            return Err(MpdError::Pending(format!(
                "cannot execute '{command}' with pending commands"
            )));
        }
        let spec = resolve(command)
            .ok_or_else(|| MpdError::UnknownCommand(command.to_string()))?;

        if self.command_list.is_some() {
            let Some(kind) = spec.response else {
                return Err(MpdError::CommandList(format!(
                    "'{command}' not allowed in command list"
                )));
            };
            self.write_command(spec.name, args)?;
            if let Some(list) = self.command_list.as_mut() {
                list.push(kind);
            }
            return Ok(Reply::None);
        }

        self.write_command(spec.name, args)?;
        match spec.response {
            Some(kind) => self.read_reply(kind, Terminator::Single),
            None => Ok(Reply::None),
        }
    }

    /// Deferred send: write the request now, fetch the response later.
    ///
    /// The command is enqueued for [`fetch`](Self::fetch) unless it is
    /// fire-and-forget. Not allowed inside a command list.
    pub fn send(&mut self, command: &str, args: &[Arg]) -> Result<()> {
        if self.command_list.is_some() {
            return Err(MpdError::CommandList(format!(
                "cannot send '{command}' in a command list"
            )));
        }
        let spec = resolve(command)
            .ok_or_else(|| MpdError::UnknownCommand(command.to_string()))?;
        self.write_command(spec.name, args)?;
        if spec.response.is_some() {
            self.pending.push_back(spec.name.to_string());
        }
        Ok(())
    }

    /// Deferred fetch: decode the response of an earlier
    /// [`send`](Self::send).
    ///
    /// The requested command must be the head of the pending queue; on
    /// a mismatch the queue is left untouched.
    pub fn fetch(&mut self, command: &str) -> Result<Reply> {
        if self.command_list.is_some() {
            return Err(MpdError::CommandList(format!(
                "cannot fetch '{command}' in a command list"
            )));
        }
        if self.iterating {
            return Err(MpdError::Iterating(format!(
                "cannot fetch '{command}' while iterating"
            )));
        }
        let spec = resolve(command)
            .ok_or_else(|| MpdError::UnknownCommand(command.to_string()))?;
        match self.pending.front() {
            None => {
                return Err(MpdError::Pending(
                    "no pending commands to fetch".to_string(),
                ));
            }
            Some(head) if head != spec.name => {
                return Err(MpdError::Pending(format!(
                    "'{}' is not the currently pending command",
                    spec.name
                )));
            }
            Some(_) => {}
        }
        self.pending.pop_front();
        match spec.response {
            Some(kind) => self.read_reply(kind, Terminator::Single),
            None => Ok(Reply::None),
        }
    }

    // -------------------------------------------------------------------------
    // Command-list batches
    // -------------------------------------------------------------------------

    /// Open a command-list batch.
    ///
    /// While open, every [`execute`](Self::execute) call is captured
    /// instead of decoded. Requires no open batch, no live iteration
    /// and an empty pending queue.
    pub fn command_list_ok_begin(&mut self) -> Result<()> {
        if self.command_list.is_some() {
            return Err(MpdError::CommandList("already in command list".to_string()));
        }
        if self.iterating {
            return Err(MpdError::Iterating(
                "cannot begin command list while iterating".to_string(),
            ));
        }
        if !self.pending.is_empty() {
            return Err(MpdError::Pending(
                "cannot begin command list with pending commands".to_string(),
            ));
        }
        self.write_command("command_list_ok_begin", &[])?;
        self.command_list = Some(Vec::new());
        Ok(())
    }

    /// Close the batch and replay the captured decoders in order.
    ///
    /// Each batched response ends at `list_OK`; one final nothing-read
    /// consumes the closing `OK`. The captured list is discarded
    /// before replay, so even a mid-replay error never leaves the
    /// connection believing a batch is still open.
    pub fn command_list_end(&mut self) -> Result<Vec<Reply>> {
        if self.command_list.is_none() {
            return Err(MpdError::CommandList("not in command list".to_string()));
        }
        if self.iterating {
            return Err(MpdError::Iterating(
                "already iterating over a command list".to_string(),
            ));
        }
        self.write_command("command_list_end", &[])?;

        let kinds = self.command_list.take().unwrap_or_default();
        let mut replies = Vec::with_capacity(kinds.len());
        for kind in kinds {
            replies.push(self.read_reply(kind, Terminator::CommandList)?);
        }
        self.read_reply(ResponseKind::Nothing, Terminator::Single)?;
        Ok(replies)
    }

    // -------------------------------------------------------------------------
    // Idle / noidle
    // -------------------------------------------------------------------------

    /// Block until something changes in one of the given subsystems
    /// (all subsystems when empty). Returns the changed names.
    pub fn idle(&mut self, subsystems: &[&str]) -> Result<Vec<String>> {
        let args: Vec<Arg> = subsystems.iter().map(|&s| s.into()).collect();
        into_list(self.execute("idle", &args)?)
    }

    /// Deferred form of [`idle`](Self::idle): write the request and
    /// return immediately. Pair with [`fetch_idle`](Self::fetch_idle)
    /// or cancel with [`noidle`](Self::noidle).
    pub fn send_idle(&mut self, subsystems: &[&str]) -> Result<()> {
        let args: Vec<Arg> = subsystems.iter().map(|&s| s.into()).collect();
        self.send("idle", &args)
    }

    /// Fetch the response of an earlier [`send_idle`](Self::send_idle)
    pub fn fetch_idle(&mut self) -> Result<Vec<String>> {
        into_list(self.fetch("idle")?)
    }

    /// Cancel a deferred idle.
    ///
    /// Only valid once an idle has been sent and not yet fetched. Pops
    /// the idle entry itself (the wire commands differ, so the normal
    /// fetch matching cannot apply) and returns whatever changed
    /// subsystems the server reports, possibly none.
    pub fn noidle(&mut self) -> Result<Vec<String>> {
        if self.pending.front().map(String::as_str) != Some("idle") {
            return Err(MpdError::Pending(
                "cannot send noidle if idle was not sent first".to_string(),
            ));
        }
        self.pending.pop_front();
        self.write_command("noidle", &[])?;
        into_list(self.read_reply(ResponseKind::List, Terminator::Single)?)
    }

    /// Convenience alias for [`noidle`](Self::noidle)
    pub fn cancel_idle(&mut self) -> Result<Vec<String>> {
        self.noidle()
    }

    // -------------------------------------------------------------------------
    // Lazy decoding
    // -------------------------------------------------------------------------

    /// Execute a list-shaped command and decode its values on demand.
    ///
    /// The connection is marked iterating for the sequence's lifetime;
    /// dropping the iterator clears the mark on every exit path.
    pub fn iter_values(&mut self, command: &str, args: &[Arg]) -> Result<ValueIter<'_, T>> {
        let spec = self.begin_iteration(command, args, |kind| {
            matches!(kind, ResponseKind::List | ResponseKind::Playlist)
        })?;
        let (separator, check_key) = match spec.response {
            Some(ResponseKind::Playlist) => (":", false),
            _ => (": ", true),
        };
        Ok(ValueIter {
            client: self,
            separator,
            check_key,
            seen: None,
            done: false,
        })
    }

    /// Execute an object-sequence command and decode its records on
    /// demand. Same sequencing rules as
    /// [`iter_values`](Self::iter_values).
    pub fn iter_objects(&mut self, command: &str, args: &[Arg]) -> Result<ObjectIter<'_, T>> {
        let spec = self.begin_iteration(command, args, |kind| {
            matches!(kind, ResponseKind::Objects(_))
        })?;
        let delimiters = match spec.response {
            Some(ResponseKind::Objects(delimiters)) => delimiters,
            _ => &[],
        };
        Ok(ObjectIter {
            client: self,
            splitter: ObjectSplitter::new(delimiters),
            done: false,
        })
    }

    fn begin_iteration(
        &mut self,
        command: &str,
        args: &[Arg],
        supported: impl Fn(ResponseKind) -> bool,
    ) -> Result<crate::protocol::CommandSpec> {
        if self.iterating {
            return Err(MpdError::Iterating(format!(
                "cannot execute '{command}' while iterating"
            )));
        }
        if !self.pending.is_empty() {
            return Err(MpdError::Pending(format!(
                "cannot execute '{command}' with pending commands"
            )));
        }
        if self.command_list.is_some() {
            return Err(MpdError::CommandList(format!(
                "cannot iterate '{command}' in a command list"
            )));
        }
        let spec = resolve(command)
            .ok_or_else(|| MpdError::UnknownCommand(command.to_string()))?;
        if !spec.response.is_some_and(&supported) {
            return Err(MpdError::Command(format!(
                "'{command}' does not support lazy decoding of this shape"
            )));
        }
        self.write_command(spec.name, args)?;
        self.iterating = true;
        Ok(spec)
    }

    // -------------------------------------------------------------------------
    // Typed convenience wrappers
    // -------------------------------------------------------------------------

    pub fn ping(&mut self) -> Result<()> {
        self.execute("ping", &[]).map(|_| ())
    }

    pub fn password(&mut self, password: &str) -> Result<()> {
        self.execute("password", &[password.into()]).map(|_| ())
    }

    pub fn clearerror(&mut self) -> Result<()> {
        self.execute("clearerror", &[]).map(|_| ())
    }

    pub fn status(&mut self) -> Result<Object> {
        into_object(self.execute("status", &[])?)
    }

    pub fn stats(&mut self) -> Result<Object> {
        into_object(self.execute("stats", &[])?)
    }

    pub fn currentsong(&mut self) -> Result<Object> {
        into_object(self.execute("currentsong", &[])?)
    }

    /// Queue contents, optionally restricted to a window
    pub fn playlistinfo(&mut self, window: Option<Range>) -> Result<Vec<Object>> {
        let args: Vec<Arg> = window.into_iter().map(Arg::from).collect();
        into_objects(self.execute("playlistinfo", &args)?)
    }

    pub fn play(&mut self, position: Option<u32>) -> Result<()> {
        let args: Vec<Arg> = position.into_iter().map(Arg::from).collect();
        self.execute("play", &args).map(|_| ())
    }

    pub fn pause(&mut self, paused: bool) -> Result<()> {
        self.execute("pause", &[u32::from(paused).into()]).map(|_| ())
    }

    pub fn stop(&mut self) -> Result<()> {
        self.execute("stop", &[]).map(|_| ())
    }

    pub fn next(&mut self) -> Result<()> {
        self.execute("next", &[]).map(|_| ())
    }

    pub fn previous(&mut self) -> Result<()> {
        self.execute("previous", &[]).map(|_| ())
    }

    pub fn setvol(&mut self, volume: u32) -> Result<()> {
        self.execute("setvol", &[volume.into()]).map(|_| ())
    }

    pub fn add(&mut self, uri: &str) -> Result<()> {
        self.execute("add", &[uri.into()]).map(|_| ())
    }

    /// Distinct values of a tag type across the database
    pub fn list(&mut self, tag: &str) -> Result<Vec<String>> {
        into_list(self.execute("list", &[tag.into()])?)
    }

    /// Trigger a database update; returns the job id when one started
    pub fn update(&mut self, path: Option<&str>) -> Result<Option<String>> {
        let args: Vec<Arg> = path.into_iter().map(Arg::from).collect();
        into_item(self.execute("update", &args)?)
    }

    /// Album art for a song, read from the given byte offset
    pub fn albumart(&mut self, uri: &str, offset: u64) -> Result<Option<BinaryChunk>> {
        into_binary(self.execute("albumart", &[uri.into(), offset.into()])?)
    }

    /// Embedded picture for a song, read from the given byte offset
    pub fn readpicture(&mut self, uri: &str, offset: u64) -> Result<Option<BinaryChunk>> {
        into_binary(self.execute("readpicture", &[uri.into(), offset.into()])?)
    }
}

/// Read and validate the handshake line, yielding the protocol version
fn handshake<T: LineTransport>(transport: &mut T) -> Result<String> {
    let line = transport.read_line().map_err(|e| match e {
        MpdError::Connection(_) => {
            MpdError::Connection("connection lost while reading MPD hello".to_string())
        }
        other => other,
    })?;
    match line.strip_prefix(HELLO_PREFIX) {
        Some(version) => Ok(version.trim().to_string()),
        None => Err(MpdError::Protocol(format!("got invalid MPD hello: '{line}'"))),
    }
}

fn into_list(reply: Reply) -> Result<Vec<String>> {
    match reply {
        Reply::List(values) => Ok(values),
        other => Err(MpdError::Protocol(format!("unexpected reply shape: {other:?}"))),
    }
}

fn into_object(reply: Reply) -> Result<Object> {
    match reply {
        Reply::Object(object) => Ok(object),
        other => Err(MpdError::Protocol(format!("unexpected reply shape: {other:?}"))),
    }
}

fn into_objects(reply: Reply) -> Result<Vec<Object>> {
    match reply {
        Reply::Objects(objects) => Ok(objects),
        other => Err(MpdError::Protocol(format!("unexpected reply shape: {other:?}"))),
    }
}

fn into_item(reply: Reply) -> Result<Option<String>> {
    match reply {
        Reply::Item(item) => Ok(item),
        other => Err(MpdError::Protocol(format!("unexpected reply shape: {other:?}"))),
    }
}

fn into_binary(reply: Reply) -> Result<Option<BinaryChunk>> {
    match reply {
        Reply::Binary(chunk) => Ok(chunk),
        other => Err(MpdError::Protocol(format!("unexpected reply shape: {other:?}"))),
    }
}

// =============================================================================
// Lazy iterators
// =============================================================================

/// On-demand values of a list-shaped response.
///
/// Finite, forward-only, non-restartable. Dropping it clears the
/// connection's iterating mark; abandoning it before exhaustion leaves
/// undecoded data on the wire, exactly as with any other interrupted
/// response.
pub struct ValueIter<'a, T: LineTransport> {
    client: &'a mut MpdClient<T>,
    separator: &'static str,
    check_key: bool,
    seen: Option<String>,
    done: bool,
}

impl<T: LineTransport> Iterator for ValueIter<'_, T> {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.client.read_pair_for_iter(self.separator) {
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
            Ok(None) => {
                self.done = true;
                self.client.iterating = false;
                None
            }
            Ok(Some((key, value))) => {
                if self.check_key {
                    match &self.seen {
                        Some(expected) if *expected != key => {
                            self.done = true;
                            let err = self.client.fail(MpdError::Protocol(format!(
                                "expected key '{expected}', got '{key}'"
                            )));
                            return Some(Err(err));
                        }
                        Some(_) => {}
                        None => self.seen = Some(key),
                    }
                }
                Some(Ok(value))
            }
        }
    }
}

impl<T: LineTransport> Drop for ValueIter<'_, T> {
    fn drop(&mut self) {
        self.client.iterating = false;
    }
}

/// On-demand records of an object-sequence response.
///
/// Same lifecycle rules as [`ValueIter`].
pub struct ObjectIter<'a, T: LineTransport> {
    client: &'a mut MpdClient<T>,
    splitter: ObjectSplitter,
    done: bool,
}

impl<T: LineTransport> Iterator for ObjectIter<'_, T> {
    type Item = Result<Object>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            match self.client.read_pair_for_iter(": ") {
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
                Ok(None) => {
                    self.done = true;
                    self.client.iterating = false;
                    return self.splitter.finish().map(Ok);
                }
                Ok(Some((key, value))) => {
                    if let Some(object) = self.splitter.feed(&key, value) {
                        return Some(Ok(object));
                    }
                }
            }
        }
    }
}

impl<T: LineTransport> Drop for ObjectIter<'_, T> {
    fn drop(&mut self) {
        self.client.iterating = false;
    }
}
