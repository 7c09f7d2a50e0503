//! Controller transports
//!
//! The load generator only sees [`Transport`] (send/receive one frame) and
//! [`Connector`] (open a fresh transport for one worker). Two endpoints are
//! provided:
//!
//! - [`TcpConnector`]: one TCP connection per worker to a running controller
//! - [`ProcessConnector`]: one controller child process per worker, framed
//!   over its stdin/stdout

use std::future::Future;
use std::process::Stdio;

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::process::{Child, ChildStdin, ChildStdout, Command};

use super::codec::{read_frame, write_frame};
use super::errors::{WireError, WireResult};

/// A bidirectional frame channel to the controller
///
/// Owned by exactly one worker; never shared.
pub trait Transport: Send {
    /// Send one framed payload
    fn send_frame(&mut self, payload: &[u8]) -> impl Future<Output = WireResult<()>> + Send;

    /// Receive one frame; `None` once the peer has closed
    fn recv_frame(&mut self) -> impl Future<Output = WireResult<Option<Vec<u8>>>> + Send;

    /// Release the connection
    fn close(self) -> impl Future<Output = WireResult<()>> + Send
    where
        Self: Sized;
}

/// Opens one transport per worker
pub trait Connector: Send + Sync + 'static {
    /// Transport produced by this connector
    type Transport: Transport + 'static;

    /// Open a new connection
    fn connect(&self) -> impl Future<Output = WireResult<Self::Transport>> + Send;

    /// Human-readable endpoint, for logs and reports
    fn describe(&self) -> String;
}

/// Framing over any async reader/writer pair
#[derive(Debug)]
pub struct FramedTransport<R, W> {
    reader: R,
    writer: W,
}

impl<R, W> FramedTransport<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    /// Wrap a reader/writer pair
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    /// Split back into the underlying halves
    pub fn into_inner(self) -> (R, W) {
        (self.reader, self.writer)
    }
}

impl<R, W> Transport for FramedTransport<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn send_frame(&mut self, payload: &[u8]) -> WireResult<()> {
        write_frame(&mut self.writer, payload).await
    }

    async fn recv_frame(&mut self) -> WireResult<Option<Vec<u8>>> {
        read_frame(&mut self.reader).await
    }

    async fn close(mut self) -> WireResult<()> {
        self.writer.shutdown().await?;
        Ok(())
    }
}

/// TCP connection split into owned halves
pub type TcpTransport = FramedTransport<OwnedReadHalf, OwnedWriteHalf>;

/// Connects to a controller listening on TCP
#[derive(Debug, Clone)]
pub struct TcpConnector {
    addr: String,
}

impl TcpConnector {
    /// `addr` is `host:port`
    pub fn new(addr: impl Into<String>) -> Self {
        Self { addr: addr.into() }
    }

    /// Build from a host and port
    pub fn from_parts(host: &str, port: u16) -> Self {
        Self::new(format!("{}:{}", host, port))
    }
}

impl Connector for TcpConnector {
    type Transport = TcpTransport;

    async fn connect(&self) -> WireResult<TcpTransport> {
        let stream = TcpStream::connect(self.addr.as_str())
            .await
            .map_err(|source| WireError::Connect {
                addr: self.addr.clone(),
                source,
            })?;
        // Requests are small and latency-bound
        stream.set_nodelay(true)?;
        let (reader, writer) = stream.into_split();
        Ok(FramedTransport::new(reader, writer))
    }

    fn describe(&self) -> String {
        format!("tcp://{}", self.addr)
    }
}

/// Controller child process talking frames over stdin/stdout
#[derive(Debug)]
pub struct ProcessTransport {
    framed: FramedTransport<ChildStdout, ChildStdin>,
    child: Child,
}

impl Transport for ProcessTransport {
    async fn send_frame(&mut self, payload: &[u8]) -> WireResult<()> {
        self.framed.send_frame(payload).await
    }

    async fn recv_frame(&mut self) -> WireResult<Option<Vec<u8>>> {
        self.framed.recv_frame().await
    }

    /// Closes stdin and reaps the child
    async fn close(self) -> WireResult<()> {
        let ProcessTransport { framed, mut child } = self;
        let (stdout, stdin) = framed.into_inner();
        drop(stdin);
        drop(stdout);
        child.wait().await?;
        Ok(())
    }
}

/// Spawns one controller process per connection
#[derive(Debug, Clone)]
pub struct ProcessConnector {
    program: String,
    args: Vec<String>,
}

impl ProcessConnector {
    /// `program` is resolved through `PATH`
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Build from a command line split into words; `None` if empty
    pub fn from_command_line(words: &[String]) -> Option<Self> {
        let (program, args) = words.split_first()?;
        Some(Self::new(program.clone(), args.to_vec()))
    }

    fn spawn_error(&self, source: std::io::Error) -> WireError {
        WireError::Spawn {
            program: self.program.clone(),
            source,
        }
    }
}

impl Connector for ProcessConnector {
    type Transport = ProcessTransport;

    async fn connect(&self) -> WireResult<ProcessTransport> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        let stdin = child.stdin.take().ok_or_else(|| {
            self.spawn_error(std::io::Error::other("child stdin not captured"))
        })?;
        let stdout = child.stdout.take().ok_or_else(|| {
            self.spawn_error(std::io::Error::other("child stdout not captured"))
        })?;

        Ok(ProcessTransport {
            framed: FramedTransport::new(stdout, stdin),
            child,
        })
    }

    fn describe(&self) -> String {
        if self.args.is_empty() {
            format!("process://{}", self.program)
        } else {
            format!("process://{} {}", self.program, self.args.join(" "))
        }
    }
}
