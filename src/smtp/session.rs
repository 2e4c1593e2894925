//! SMTP session: one client connection from greeting to close

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{
    AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, BufWriter,
    ReadHalf, WriteHalf,
};
use tokio_util::sync::CancellationToken;

use crate::smtp::body::{BodyLine, BodyTooBig, MessageBody};
use crate::smtp::commands::{Command, CommandHandler};
use crate::smtp::config::{COMMAND_LINE_MAX_LENGTH, Configuration};
use crate::smtp::error::SmtpError;
use crate::smtp::grammar;
use crate::smtp::logging::Logger;
use crate::smtp::message::Message;
use crate::smtp::message_list::MessageSink;
use crate::smtp::response::Reply;

/// Drives the dialogue on a single connection and records it in a
/// [`Message`]
#[derive(Debug)]
pub struct Session<S> {
    config: Arc<Configuration>,
    reader: BufReader<ReadHalf<S>>,
    writer: BufWriter<WriteHalf<S>>,
    /// Client address, used to prefix log lines
    peer: String,
    message: Message,
    /// Response text of the last rejected command
    error: Option<String>,
    logger: Logger,
}

impl<S> Session<S>
where
    S: AsyncRead + AsyncWrite,
{
    pub fn new(
        stream: S,
        peer: impl Into<String>,
        config: Arc<Configuration>,
        logger: Logger,
    ) -> Self {
        let (reader, writer) = tokio::io::split(stream);

        Self {
            config,
            reader: BufReader::new(reader),
            writer: BufWriter::new(writer),
            peer: peer.into(),
            message: Message::default(),
            error: None,
            logger,
        }
    }

    /// Serve the client until it quits, fails fast, goes idle or
    /// disconnects. A snapshot of the record is appended to `sink` after
    /// every dispatched command. Returns the final record.
    pub async fn run(mut self, sink: &MessageSink, shutdown: &CancellationToken) -> Message {
        match self.serve(sink, shutdown).await {
            Ok(()) => {}
            Err(SmtpError::ConnectionClosed) => {
                self.logger
                    .info_activity(&format!("{}: client closed the connection", self.peer));
            }
            Err(err) if err.is_connection_error() => {
                self.logger.error(&format!("{}: {err}", self.peer));
            }
            Err(err) => self
                .logger
                .error(&format!("{}: unable to record message: {err}", self.peer)),
        }

        self.finish().await;
        self.message
    }

    async fn serve(
        &mut self,
        sink: &MessageSink,
        shutdown: &CancellationToken,
    ) -> Result<(), SmtpError> {
        let greeting = Reply::accepted(&self.config.messages.greeting, Duration::ZERO);
        self.send_reply(&greeting).await?;

        while !shutdown.is_cancelled() {
            let Some(request) = self.read_request().await? else {
                self.reject_invalid().await?;
                self.skip_line().await?;
                continue;
            };

            let command = grammar::is_available_command(&request)
                .then(|| Command::recognize(&request))
                .flatten();
            let Some(command) = command else {
                self.reject_invalid().await?;
                continue;
            };

            let dispatched = self.dispatch(command, &request).await;
            sink.append(self.message.clone()).await?;
            dispatched?;

            if self.is_able_to_end() {
                break;
            }
        }

        Ok(())
    }

    async fn dispatch(&mut self, command: Command, request: &str) -> Result<(), SmtpError> {
        let config = Arc::clone(&self.config);
        let handler = CommandHandler::new(&config);

        if command == Command::Mail
            && config.multiple_message_receiving
            && self.message.rset
            && self.message.is_consistent()
        {
            self.message = self.message.helo_context();
        }

        let mut reply = handler.process_command(command, request, &mut self.message);
        self.send_reply(&reply).await?;

        if command == Command::Data && reply.success {
            let body = self.read_body().await?;
            reply = handler.finish_body(body, &mut self.message);
            self.send_reply(&reply).await?;
        }

        self.error = (!reply.success).then_some(reply.text);
        Ok(())
    }

    fn is_able_to_end(&self) -> bool {
        self.message.quit_sent || (self.error.is_some() && self.config.is_cmd_fail_fast)
    }

    /// Read one raw line of at most `limit` bytes under the idle timeout,
    /// terminator included
    async fn read_line(&mut self, buf: &mut Vec<u8>, limit: usize) -> Result<LineRead, SmtpError> {
        tokio::time::timeout(
            self.config.session_timeout,
            read_capped_line(&mut self.reader, buf, limit),
        )
        .await
        .map_err(|_| SmtpError::Timeout)?
    }

    /// Throw away input up to and including the next line feed
    async fn skip_line(&mut self) -> Result<(), SmtpError> {
        tokio::time::timeout(self.config.session_timeout, skip_line(&mut self.reader))
            .await
            .map_err(|_| SmtpError::Timeout)?
    }

    /// Drop whatever the client already pushed
    fn discard_buffered(&mut self) {
        let buffered = self.reader.buffer().len();
        self.reader.consume(buffered);
    }

    /// Next command line, `None` if it is longer than a command may be
    async fn read_request(&mut self) -> Result<Option<String>, SmtpError> {
        let mut buf = Vec::new();
        if self.read_line(&mut buf, COMMAND_LINE_MAX_LENGTH).await? == LineRead::TooLong {
            self.logger
                .info_activity(&format!("{}: request: command line too long", self.peer));
            return Ok(None);
        }

        let request = String::from_utf8_lossy(&buf).trim().to_owned();
        self.logger
            .info_activity(&format!("{}: request: {request}", self.peer));
        Ok(Some(request))
    }

    async fn reject_invalid(&mut self) -> Result<(), SmtpError> {
        let reply = Reply::rejected(&self.config.messages.invalid_cmd, Duration::ZERO);
        self.send_reply(&reply).await
    }

    /// Collect the message body after an accepted DATA
    async fn read_body(&mut self) -> Result<Result<String, BodyTooBig>, SmtpError> {
        let limit = self.config.msg_size_limit;
        let mut body = MessageBody::new(limit);
        let mut line = Vec::new();

        loop {
            // A line longer than the room left, plus one stripped period,
            // can never fit. The terminator always can.
            let room = limit.saturating_sub(body.len()).saturating_add(1).max(3);

            line.clear();
            let read = self.read_line(&mut line, room).await?;
            self.logger
                .info_activity(&format!("{}: request: message binary data", self.peer));

            let pushed = match read {
                LineRead::Complete => body.push_line(&line),
                LineRead::TooLong => Err(BodyTooBig { limit }),
            };
            match pushed {
                Ok(BodyLine::Continue) => {}
                Ok(BodyLine::End) => return Ok(Ok(body.into_string())),
                Err(too_big) => {
                    // The rest of the body is read as commands
                    self.discard_buffered();
                    return Ok(Err(too_big));
                }
            }
        }
    }

    async fn send_reply(&mut self, reply: &Reply) -> Result<(), SmtpError> {
        if !reply.delay.is_zero() {
            self.logger.info_activity(&format!(
                "{}: response delay: {:?}",
                self.peer, reply.delay
            ));
            tokio::time::sleep(reply.delay).await;
        }

        self.writer.write_all(reply.format().as_bytes()).await?;
        self.writer.flush().await?;

        self.logger
            .info_activity(&format!("{}: response: {}", self.peer, reply.text));
        Ok(())
    }

    async fn finish(&mut self) {
        if let Err(err) = self.writer.shutdown().await {
            self.logger
                .warning(&format!("{}: closing connection: {err}", self.peer));
        }

        self.logger
            .info_activity(&format!("{}: session end", self.peer));
    }
}

/// Outcome of a length-capped line read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineRead {
    /// `buf` holds a whole line, or the last bytes before EOF
    Complete,
    /// The line would pass the limit. Nothing past what `buf` holds was
    /// consumed.
    TooLong,
}

/// `read_until(b'\n')` that gives up once the line would exceed `limit`
/// bytes, so a client cannot grow the buffer without bound
async fn read_capped_line<R>(
    reader: &mut R,
    buf: &mut Vec<u8>,
    limit: usize,
) -> Result<LineRead, SmtpError>
where
    R: AsyncBufRead + Unpin,
{
    loop {
        let available = reader.fill_buf().await?;
        if available.is_empty() {
            if buf.is_empty() {
                return Err(SmtpError::ConnectionClosed);
            }
            return Ok(LineRead::Complete);
        }

        let (used, complete) = match available.iter().position(|&b| b == b'\n') {
            Some(end) => (end + 1, true),
            None => (available.len(), false),
        };
        if buf.len() + used > limit {
            return Ok(LineRead::TooLong);
        }

        buf.extend_from_slice(&available[..used]);
        reader.consume(used);
        if complete {
            return Ok(LineRead::Complete);
        }
    }
}

async fn skip_line<R>(reader: &mut R) -> Result<(), SmtpError>
where
    R: AsyncBufRead + Unpin,
{
    loop {
        let available = reader.fill_buf().await?;
        if available.is_empty() {
            return Err(SmtpError::ConnectionClosed);
        }

        match available.iter().position(|&b| b == b'\n') {
            Some(end) => {
                reader.consume(end + 1);
                return Ok(());
            }
            None => {
                let used = available.len();
                reader.consume(used);
            }
        }
    }
}
