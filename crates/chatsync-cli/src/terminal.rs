//! Terminal driver.
//!
//! Implements the [`Driver`] trait for a scrolling terminal: crossterm key
//! events feed the composer, submitted lines become intents, and the
//! WebSocket transport carries frames.

use std::io::{self, Stdout, Write, stdout};

use chatsync_app::{Driver, DriverInput, UserIntent};
use chatsync_client::{
    Client, Environment, NoticeLevel,
    transport::{self, TransportError, TransportEvent, WsTransport},
};
use chatsync_core::Room;
use crossterm::{
    QueueableCommand,
    cursor::MoveToColumn,
    event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    style::Print,
    terminal::{Clear, ClearType, disable_raw_mode, enable_raw_mode},
};
use futures::StreamExt;
use thiserror::Error;

use crate::{
    commands::{self, Command},
    input::{InputState, KeyInput, KeyOutcome},
    render::{self, Screen},
};

/// Terminal driver errors.
#[derive(Debug, Error)]
pub enum TerminalError {
    /// I/O error from terminal operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Transport error.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The socket task is gone.
    #[error("transport closed")]
    ChannelClosed,
}

/// What woke `recv`.
enum Wake {
    Transport(Option<TransportEvent>),
    Terminal(Option<io::Result<Event>>),
}

/// Terminal driver implementing the [`Driver`] trait.
pub struct TerminalDriver {
    out: Stdout,
    events: EventStream,
    connection: Option<WsTransport>,
    endpoint: String,
    input: InputState,
    screen: Screen,
    /// Room list as of the last render, for `/rooms`.
    rooms: Vec<Room>,
}

impl TerminalDriver {
    /// Put the terminal in raw mode and prepare to connect to `endpoint`.
    pub fn new(endpoint: String) -> Result<Self, TerminalError> {
        enable_raw_mode()?;
        Ok(Self {
            out: stdout(),
            events: EventStream::new(),
            connection: None,
            endpoint,
            input: InputState::new(),
            screen: Screen::new(),
            rooms: Vec::new(),
        })
    }

    fn convert_key(event: KeyEvent) -> Option<KeyInput> {
        if event.modifiers.contains(KeyModifiers::CONTROL) {
            return matches!(event.code, KeyCode::Char('c' | 'd')).then_some(KeyInput::Esc);
        }
        match event.code {
            KeyCode::Char(c) => Some(KeyInput::Char(c)),
            KeyCode::Enter => Some(KeyInput::Enter),
            KeyCode::Backspace => Some(KeyInput::Backspace),
            KeyCode::Delete => Some(KeyInput::Delete),
            KeyCode::Esc => Some(KeyInput::Esc),
            KeyCode::Left => Some(KeyInput::Left),
            KeyCode::Right => Some(KeyInput::Right),
            KeyCode::Home => Some(KeyInput::Home),
            KeyCode::End => Some(KeyInput::End),
            _ => None,
        }
    }

    /// Print lines above the prompt, then redraw the prompt.
    fn print_lines(&mut self, lines: &[String]) -> io::Result<()> {
        self.out.queue(MoveToColumn(0))?.queue(Clear(ClearType::CurrentLine))?;
        for line in lines {
            self.out.queue(Print(line))?.queue(Print("\r\n"))?;
        }
        let prompt = render::prompt(self.screen.room(), self.input.buffer());
        self.out.queue(Print(prompt))?;
        self.out.flush()
    }

    /// Turn a submitted line into an input. `None` if it was handled here.
    fn submit(&mut self, line: &str) -> io::Result<Option<DriverInput>> {
        let active = self.screen.room().cloned();
        let intent = match commands::parse(line) {
            Command::Message { text } => UserIntent::Send(text),
            Command::Open { room_id } => UserIntent::OpenRoom(room_id),
            Command::Direct { user_id } => UserIntent::OpenDirect(user_id),
            Command::Group { name, members } => UserIntent::CreateGroup { name, members },
            Command::Close => UserIntent::CloseRoom,
            Command::Leave { room_id } => match room_id.or(active) {
                Some(room_id) => UserIntent::Leave(room_id),
                None => return self.local_notice("No room open").map(|()| None),
            },
            Command::Delete { room_id } => match room_id.or(active) {
                Some(room_id) => UserIntent::Delete(room_id),
                None => return self.local_notice("No room open").map(|()| None),
            },
            Command::Quit => return Ok(Some(DriverInput::Quit)),
            Command::Rooms => {
                let lines = render::room_lines(&self.rooms, self.screen.room());
                return self.print_lines(&lines).map(|()| None);
            },
            Command::Help => return self.local_notice(commands::HELP).map(|()| None),
            Command::Unknown { input } => {
                return self.local_notice(&format!("Unknown command: /{input}")).map(|()| None);
            },
            Command::InvalidArgs { command, error } => {
                return self.local_notice(&format!("/{command}: {error}")).map(|()| None);
            },
        };
        Ok(Some(DriverInput::Intent(intent)))
    }

    fn local_notice(&mut self, message: &str) -> io::Result<()> {
        self.print_lines(&[format!("* {message}")])
    }

    fn handle_key(&mut self, key: KeyInput) -> io::Result<Option<DriverInput>> {
        match self.input.handle_key(key) {
            KeyOutcome::Edited => {
                self.print_lines(&[])?;
                let composing = self.screen.room().is_some()
                    && !self.input.is_command()
                    && !self.input.buffer().is_empty();
                Ok(composing.then_some(DriverInput::Intent(UserIntent::Keystroke)))
            },
            KeyOutcome::Moved => self.print_lines(&[]).map(|()| None),
            KeyOutcome::Submitted(line) => {
                self.print_lines(&[])?;
                self.submit(&line)
            },
            KeyOutcome::Quit => Ok(Some(DriverInput::Quit)),
        }
    }
}

impl Driver for TerminalDriver {
    type Error = TerminalError;

    async fn connect(&mut self) -> Result<(), TerminalError> {
        let connection = transport::connect(&self.endpoint).await?;
        self.connection = Some(connection);
        Ok(())
    }

    async fn send_text(&mut self, text: String) -> Result<(), TerminalError> {
        let connection = self.connection.as_ref().ok_or(TerminalError::ChannelClosed)?;
        connection.outbound.send(text).await.map_err(|_| TerminalError::ChannelClosed)
    }

    async fn recv(&mut self) -> DriverInput {
        loop {
            let connection = &mut self.connection;
            let events = &mut self.events;
            let woke = tokio::select! {
                transport_event = async {
                    match connection.as_mut() {
                        Some(connection) => connection.inbound.recv().await,
                        None => std::future::pending().await,
                    }
                } => Wake::Transport(transport_event),
                terminal_event = events.next() => Wake::Terminal(terminal_event),
            };

            let input = match woke {
                Wake::Transport(Some(TransportEvent::Frame(text))) => Some(DriverInput::Frame(text)),
                Wake::Transport(Some(TransportEvent::Closed { reason })) => {
                    self.connection = None;
                    Some(DriverInput::TransportClosed { reason })
                },
                Wake::Transport(None) => {
                    self.connection = None;
                    Some(DriverInput::TransportClosed { reason: "transport task ended".to_string() })
                },
                Wake::Terminal(Some(Ok(Event::Key(key)))) if key.kind == KeyEventKind::Press => {
                    match Self::convert_key(key).map(|key| self.handle_key(key)) {
                        Some(Ok(input)) => input,
                        Some(Err(err)) => {
                            tracing::error!(error = %err, "terminal write failed");
                            Some(DriverInput::Quit)
                        },
                        None => None,
                    }
                },
                Wake::Terminal(Some(Ok(_))) => None,
                Wake::Terminal(Some(Err(err))) => {
                    tracing::error!(error = %err, "terminal read failed");
                    Some(DriverInput::Quit)
                },
                Wake::Terminal(None) => Some(DriverInput::Quit),
            };

            if let Some(input) = input {
                return input;
            }
        }
    }

    fn close(&mut self) {
        if let Some(connection) = self.connection.take() {
            connection.stop();
        }
    }

    fn notify(&mut self, level: NoticeLevel, message: &str) -> Result<(), TerminalError> {
        let line = match level {
            NoticeLevel::Info => format!("* {message}"),
            NoticeLevel::Error => format!("! {message}"),
        };
        self.print_lines(&[line])?;
        Ok(())
    }

    fn render<E: Environment>(&mut self, client: &Client<E>) -> Result<(), TerminalError> {
        let lines = self.screen.update(client);
        self.rooms = client.room_list();
        self.print_lines(&lines)?;
        Ok(())
    }
}

impl Drop for TerminalDriver {
    fn drop(&mut self) {
        self.close();
        let _ = self.out.queue(Print("\r\n")).and_then(|out| out.flush());
        let _ = disable_raw_mode();
    }
}
