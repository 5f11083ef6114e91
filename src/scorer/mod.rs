mod signal_refresher;

pub use signal_refresher::SignalRefresher;
