use bon::Builder;

/// Options for configuring the session manager. All fields are required.
///
/// ```
/// use rocket_session_store::SessionsOptions;
///
/// let options = SessionsOptions::builder()
///     .cookie_name("sid")
///     .max_age(60 * 60)
///     .gc_interval(5 * 60)
///     .build();
/// ```
#[derive(Builder, Clone, Debug)]
pub struct SessionsOptions {
    /// The name of the cookie holding the session ID
    #[builder(into)]
    pub cookie_name: String,
    /// Session lifetime in seconds. This is both the cookie's `Max-Age` attribute and
    /// the lifetime given to newly created sessions.
    pub max_age: u32,
    /// Seconds between garbage collection sweeps of the store. Keep this well below
    /// `max_age`; `0` disables the sweep.
    pub gc_interval: u32,
}
