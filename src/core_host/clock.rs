/// Real-time clock capability. Hosts without an RTC report 0 and the engine
/// falls back to dateless formatting.
pub trait Clock {
    /// Current UTC time as Unix seconds, or 0 when unknown.
    fn now_unix(&self) -> i64;
}
