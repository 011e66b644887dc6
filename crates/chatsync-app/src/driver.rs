//! Driver trait for abstracting I/O operations.
//!
//! The [`Driver`] trait decouples the runtime from the platform: where user
//! input comes from, how the transport socket is opened, and how the session
//! is shown. The generic [`crate::Runtime`] handles all orchestration, so the
//! same loop runs in the terminal client and in simulation.

use std::future::Future;

use chatsync_client::{Client, Environment, NoticeLevel};

use crate::UserIntent;

/// Input produced by a driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverInput {
    /// Text frame from the transport.
    Frame(String),
    /// The transport closed or failed.
    TransportClosed {
        /// Close or error description
        reason: String,
    },
    /// User intent.
    Intent(UserIntent),
    /// The user ended the session.
    Quit,
}

/// Abstracts I/O operations for the runtime.
///
/// # Implementations
///
/// - **Terminal**: stdin commands and a WebSocket transport
/// - **Simulation**: scripted inputs and captured output
pub trait Driver: Send {
    /// Platform-specific error type.
    type Error: std::error::Error + Send + 'static;

    /// Open the transport.
    ///
    /// # Errors
    ///
    /// Returns an error if the socket cannot be opened. The runtime reports it
    /// to the client as a transport failure.
    fn connect(&mut self) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Send one text frame.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport is gone.
    fn send_text(&mut self, text: String) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Wait for the next input.
    ///
    /// Must be cancel safe: the runtime races it against store pushes and
    /// the tick timer.
    fn recv(&mut self) -> impl Future<Output = DriverInput> + Send;

    /// Close the transport and release resources.
    fn close(&mut self);

    /// Show a notice to the user.
    ///
    /// # Errors
    ///
    /// Returns an error if output fails.
    fn notify(&mut self, level: NoticeLevel, message: &str) -> Result<(), Self::Error>;

    /// Show the current session state.
    ///
    /// # Errors
    ///
    /// Returns an error if output fails.
    fn render<E: Environment>(&mut self, client: &Client<E>) -> Result<(), Self::Error>;
}
