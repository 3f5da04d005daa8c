//! Per-actuator PWM timing: period, duty range, and angular range.
//!
//! Use [`ServoConfig::DEFAULT`] for hobby servos like the SG90, the `const` builders to adjust
//! one value, or the [`servo_config!`] macro for a keyword-driven constructor with defaults.

use crate::mapping::map;

/// Default PWM period in nanoseconds (20 ms, 50 Hz).
pub const SERVO_PERIOD_NS_DEFAULT: u32 = 20_000_000;

/// Default duty cycle for 0° in nanoseconds.
pub const SERVO_MIN_DUTY_NS_DEFAULT: u32 = 500_000;

/// Default duty cycle for the maximum angle in nanoseconds.
pub const SERVO_MAX_DUTY_NS_DEFAULT: u32 = 2_300_000;

/// Default maximum servo angle in degrees.
pub const SERVO_MAX_DEGREES_DEFAULT: u16 = 180;

/// Create a [`ServoConfig`] with keyword arguments and default timing.
///
/// All fields are optional: `period_ns`, `min_duty_ns`, `max_duty_ns`, `max_degrees`
/// (defaults to [`SERVO_PERIOD_NS_DEFAULT`], [`SERVO_MIN_DUTY_NS_DEFAULT`],
/// [`SERVO_MAX_DUTY_NS_DEFAULT`], [`SERVO_MAX_DEGREES_DEFAULT`]).
///
/// ```rust
/// use servo_envoy::{config::ServoConfig, servo_config};
///
/// const MG996R: ServoConfig = servo_config! {
///     min_duty_ns: 1_000_000,
///     max_duty_ns: 2_000_000,
/// };
/// assert_eq!(MG996R.period_ns(), 20_000_000);
/// assert_eq!(MG996R.angle_to_duty_ns(90), 1_500_000);
/// ```
#[macro_export]
macro_rules! servo_config {
    ($($tt:tt)*) => { $crate::__servo_config_impl! { $($tt)* } };
}
#[doc(inline)]
pub use servo_config;

// Public for macro expansion in downstream crates.
#[doc(hidden)]
#[macro_export]
macro_rules! __servo_config_impl {
    (@__fill_defaults
        period_ns: $period_ns:expr,
        min_duty_ns: $min_duty_ns:expr,
        max_duty_ns: $max_duty_ns:expr,
        max_degrees: $max_degrees:expr,
        fields: [ ]
    ) => {
        $crate::config::ServoConfig::new($period_ns, $min_duty_ns, $max_duty_ns)
            .with_max_degrees($max_degrees)
    };

    (@__fill_defaults
        period_ns: $period_ns:expr,
        min_duty_ns: $min_duty_ns:expr,
        max_duty_ns: $max_duty_ns:expr,
        max_degrees: $max_degrees:expr,
        fields: [ period_ns: $value:expr $(, $($rest:tt)*)? ]
    ) => {
        $crate::__servo_config_impl! {
            @__fill_defaults
            period_ns: $value,
            min_duty_ns: $min_duty_ns,
            max_duty_ns: $max_duty_ns,
            max_degrees: $max_degrees,
            fields: [ $($($rest)*)? ]
        }
    };

    (@__fill_defaults
        period_ns: $period_ns:expr,
        min_duty_ns: $min_duty_ns:expr,
        max_duty_ns: $max_duty_ns:expr,
        max_degrees: $max_degrees:expr,
        fields: [ min_duty_ns: $value:expr $(, $($rest:tt)*)? ]
    ) => {
        $crate::__servo_config_impl! {
            @__fill_defaults
            period_ns: $period_ns,
            min_duty_ns: $value,
            max_duty_ns: $max_duty_ns,
            max_degrees: $max_degrees,
            fields: [ $($($rest)*)? ]
        }
    };

    (@__fill_defaults
        period_ns: $period_ns:expr,
        min_duty_ns: $min_duty_ns:expr,
        max_duty_ns: $max_duty_ns:expr,
        max_degrees: $max_degrees:expr,
        fields: [ max_duty_ns: $value:expr $(, $($rest:tt)*)? ]
    ) => {
        $crate::__servo_config_impl! {
            @__fill_defaults
            period_ns: $period_ns,
            min_duty_ns: $min_duty_ns,
            max_duty_ns: $value,
            max_degrees: $max_degrees,
            fields: [ $($($rest)*)? ]
        }
    };

    (@__fill_defaults
        period_ns: $period_ns:expr,
        min_duty_ns: $min_duty_ns:expr,
        max_duty_ns: $max_duty_ns:expr,
        max_degrees: $max_degrees:expr,
        fields: [ max_degrees: $value:expr $(, $($rest:tt)*)? ]
    ) => {
        $crate::__servo_config_impl! {
            @__fill_defaults
            period_ns: $period_ns,
            min_duty_ns: $min_duty_ns,
            max_duty_ns: $max_duty_ns,
            max_degrees: $value,
            fields: [ $($($rest)*)? ]
        }
    };

    (@__fill_defaults
        period_ns: $period_ns:expr,
        min_duty_ns: $min_duty_ns:expr,
        max_duty_ns: $max_duty_ns:expr,
        max_degrees: $max_degrees:expr,
        fields: [ $unknown:ident : $($rest:tt)* ]
    ) => {
        compile_error!(concat!("servo_config! has no field `", stringify!($unknown), "`"));
    };

    (
        $($fields:tt)*
    ) => {
        $crate::__servo_config_impl! {
            @__fill_defaults
            period_ns: $crate::config::SERVO_PERIOD_NS_DEFAULT,
            min_duty_ns: $crate::config::SERVO_MIN_DUTY_NS_DEFAULT,
            max_duty_ns: $crate::config::SERVO_MAX_DUTY_NS_DEFAULT,
            max_degrees: $crate::config::SERVO_MAX_DEGREES_DEFAULT,
            fields: [ $($fields)* ]
        }
    };
}

/// PWM timing for one servo actuator.
///
/// Invariants (checked by every constructor): `period_ns > 0`,
/// `min_duty_ns < max_duty_ns <= period_ns`, `max_degrees > 0`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ServoConfig {
    period_ns: u32,
    min_duty_ns: u32,
    max_duty_ns: u32,
    max_degrees: u16,
}

impl Default for ServoConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl ServoConfig {
    /// 50 Hz period with a 0.5–2.3 ms duty range over 0–180°.
    pub const DEFAULT: Self = Self::new(
        SERVO_PERIOD_NS_DEFAULT,
        SERVO_MIN_DUTY_NS_DEFAULT,
        SERVO_MAX_DUTY_NS_DEFAULT,
    );

    /// Create a config covering [`SERVO_MAX_DEGREES_DEFAULT`] degrees.
    ///
    /// # Panics
    ///
    /// Panics (at compile time in `const` contexts) if the timing is inconsistent.
    #[must_use]
    pub const fn new(period_ns: u32, min_duty_ns: u32, max_duty_ns: u32) -> Self {
        assert!(period_ns > 0, "period_ns must be positive");
        assert!(min_duty_ns < max_duty_ns, "min_duty_ns must be less than max_duty_ns");
        assert!(max_duty_ns <= period_ns, "max_duty_ns must fit in the PWM period");
        Self {
            period_ns,
            min_duty_ns,
            max_duty_ns,
            max_degrees: SERVO_MAX_DEGREES_DEFAULT,
        }
    }

    /// Return a copy with a different PWM period.
    ///
    /// # Panics
    ///
    /// Panics if the duty range no longer fits in the period.
    #[must_use]
    pub const fn with_period_ns(self, period_ns: u32) -> Self {
        Self::new(period_ns, self.min_duty_ns, self.max_duty_ns).with_max_degrees(self.max_degrees)
    }

    /// Return a copy with a different duty range.
    ///
    /// # Panics
    ///
    /// Panics if the range is empty or does not fit in the period.
    #[must_use]
    pub const fn with_duty_range_ns(self, min_duty_ns: u32, max_duty_ns: u32) -> Self {
        Self::new(self.period_ns, min_duty_ns, max_duty_ns).with_max_degrees(self.max_degrees)
    }

    /// Return a copy with a different maximum angle.
    ///
    /// # Panics
    ///
    /// Panics if `max_degrees` is zero.
    #[must_use]
    pub const fn with_max_degrees(mut self, max_degrees: u16) -> Self {
        assert!(max_degrees > 0, "max_degrees must be positive");
        self.max_degrees = max_degrees;
        self
    }

    /// PWM period in nanoseconds.
    #[must_use]
    pub const fn period_ns(&self) -> u32 {
        self.period_ns
    }

    /// Duty cycle for 0° in nanoseconds.
    #[must_use]
    pub const fn min_duty_ns(&self) -> u32 {
        self.min_duty_ns
    }

    /// Duty cycle for [`max_degrees`](Self::max_degrees) in nanoseconds.
    #[must_use]
    pub const fn max_duty_ns(&self) -> u32 {
        self.max_duty_ns
    }

    /// Largest accepted angle in degrees.
    #[must_use]
    pub const fn max_degrees(&self) -> u16 {
        self.max_degrees
    }

    /// Duty cycle midway between the ends of the range.
    #[must_use]
    pub const fn center_duty_ns(&self) -> u32 {
        self.min_duty_ns + (self.max_duty_ns - self.min_duty_ns) / 2
    }

    /// Whether `degrees` lies in `0..=max_degrees`.
    #[must_use]
    pub fn accepts_angle(&self, degrees: i32) -> bool {
        (0..=i32::from(self.max_degrees)).contains(&degrees)
    }

    /// Map an angle (clamped to `0..=max_degrees`) to a duty cycle in nanoseconds.
    #[must_use]
    pub fn angle_to_duty_ns(&self, degrees: i32) -> u32 {
        let duty_ns = map(
            i64::from(degrees),
            0,
            i64::from(self.max_degrees),
            i64::from(self.min_duty_ns),
            i64::from(self.max_duty_ns),
        );
        // The mapping stays inside [min_duty_ns, max_duty_ns].
        u32::try_from(duty_ns).unwrap_or(self.min_duty_ns)
    }

    /// Map a duty cycle (clamped to the duty range) back to an angle in degrees.
    #[must_use]
    pub fn duty_ns_to_angle(&self, duty_ns: u32) -> i32 {
        let degrees = map(
            i64::from(duty_ns),
            i64::from(self.min_duty_ns),
            i64::from(self.max_duty_ns),
            0,
            i64::from(self.max_degrees),
        );
        i32::try_from(degrees).unwrap_or(0)
    }
}
