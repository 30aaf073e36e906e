pub mod constituents_sync;
