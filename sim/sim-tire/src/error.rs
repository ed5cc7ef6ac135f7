//! Error types for the tire contact model.

use thiserror::Error;

/// Result type alias for tire operations.
pub type TireResult<T> = Result<T, TireError>;

/// Errors that can occur while configuring or stepping a wheel.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TireError {
    /// Parameters failed validation.
    #[error("invalid tire configuration: {reason}")]
    InvalidConfig {
        /// What is wrong.
        reason: String,
    },

    /// No rigid body could be resolved for the wheel.
    #[error("wheel '{wheel}' has no rigid body")]
    MissingBody {
        /// Wheel name.
        wheel: String,
    },

    /// No wheel mesh could be resolved for the wheel.
    #[error("wheel '{wheel}' has no wheel mesh")]
    MissingWheelMesh {
        /// Wheel name.
        wheel: String,
    },

    /// A frame axis is zero-length or not finite.
    #[error("degenerate wheel frame: {axis} axis is zero-length or not finite")]
    DegenerateFrame {
        /// Which axis.
        axis: &'static str,
    },

    /// The body pose contains `NaN` or `Inf`.
    #[error("wheel '{wheel}' body pose is not finite")]
    NonFinitePose {
        /// Wheel name.
        wheel: String,
    },
}

impl TireError {
    /// Create an invalid configuration error.
    #[must_use]
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Create a missing body error.
    #[must_use]
    pub fn missing_body(wheel: impl Into<String>) -> Self {
        Self::MissingBody {
            wheel: wheel.into(),
        }
    }

    /// Create a missing wheel mesh error.
    #[must_use]
    pub fn missing_wheel_mesh(wheel: impl Into<String>) -> Self {
        Self::MissingWheelMesh {
            wheel: wheel.into(),
        }
    }

    /// Create a degenerate frame error.
    #[must_use]
    pub const fn degenerate_frame(axis: &'static str) -> Self {
        Self::DegenerateFrame { axis }
    }

    /// Check if this is a configuration error.
    #[must_use]
    pub fn is_config_error(&self) -> bool {
        matches!(self, Self::InvalidConfig { .. })
    }

    /// Check if this error leaves the wheel permanently inert.
    #[must_use]
    pub fn is_missing_collaborator(&self) -> bool {
        matches!(self, Self::MissingBody { .. } | Self::MissingWheelMesh { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TireError::invalid_config("kp must be positive");
        assert!(err.to_string().contains("kp must be positive"));
        assert!(err.is_config_error());

        let err = TireError::missing_body("front_left");
        assert!(err.to_string().contains("front_left"));
        assert!(err.is_missing_collaborator());

        let err = TireError::degenerate_frame("right");
        assert!(err.to_string().contains("right"));
        assert!(!err.is_missing_collaborator());
    }
}
