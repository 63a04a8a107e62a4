//! The node's four concurrent components: status responder, input
//! receiver, processor, and output sender. Grounded on the Go original's
//! `actor/{status,inputs,processor,outputs}` packages — one file per
//! component there, one module per component here.

pub mod processor;
pub mod receiver;
pub mod sender;
pub mod status;
