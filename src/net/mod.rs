//! Network clients for the mill-stream event loop.
//!
//! The design avoids async/await: a client registers readiness interest with a
//! [`Reactor`](crate::reactor::Reactor), and the loop driving that reactor
//! calls back into the client when the OS reports the socket ready. The client
//! in turn reports progress to user callbacks.
//!
//! # Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      User Application                       │
//! │  ┌──────────────┐          ┌─────────────────┐              │
//! │  │ StreamClient │─────────▶│ Your callbacks  │              │
//! │  │              │          │ (connect, read, │              │
//! │  └──────────────┘          │  eof, error)    │              │
//! │                            └─────────────────┘              │
//! └────────────┬──────────────────────▲─────────────────────────┘
//!              │ register /           │ handle_ready(interest)
//!              │ unregister           │
//!              ▼                      │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  mill-stream EventLoop                      │
//! │  ┌──────────┐       ┌──────────────────┐                    │
//! │  │ mio Poll │─────▶│ token → handler   │                    │
//! │  └──────────┘       └──────────────────┘                    │
//! └────────────┬────────────────────────────────────────────────┘
//!              │ OS Events
//!              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                Operating System (epoll/kqueue)              │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Everything runs on the thread that calls
//! [`EventLoop::run_once`](crate::EventLoop::run_once); callbacks run to
//! completion before the next event is dispatched.

pub mod errors;
pub mod tcp;
