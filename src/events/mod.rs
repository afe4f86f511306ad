//! # Events Module
//!
//! Progress reporting decoupled from presentation.
//!
//! ## Design
//! The import and clean pipelines emit events through a channel; the CLI
//! consumes them to drive its spinner and verbose log lines. Sending never
//! blocks the pipeline on a missing listener.
//!
//! ## Example
//! ```rust,ignore
//! let (sender, receiver) = EventChannel::new();
//!
//! std::thread::spawn(move || {
//!     for event in receiver.iter() {
//!         if let Event::Import(ImportEvent::Transferred { target, .. }) = event {
//!             println!("-> {}", target.display());
//!         }
//!     }
//! });
//!
//! pipeline.run(&token, &sender)?;
//! ```

mod channel;
mod types;

pub use channel::{null_sender, EventChannel, EventReceiver, EventSender};
pub use types::*;
