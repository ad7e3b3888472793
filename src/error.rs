use thiserror::Error;

/// Errors raised by the simulation and scoring engine
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    #[error("Invalid balance: {balance} (must be finite and >= 0)")]
    InvalidBalance { balance: f64 },

    #[error("Invalid bet percentage: {percentage} (must be between 0 and 100)")]
    InvalidBetPercentage { percentage: f64 },

    #[error("Invalid bet count: {requested} (max {max})")]
    InvalidBetCount { requested: u32, max: u32 },

    #[error("Invalid risk profile for bot {bot_id}: {reason}")]
    InvalidRiskProfile { bot_id: String, reason: String },

    #[error("Malformed game {game_id}: {reason}")]
    MalformedGame { game_id: String, reason: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type EngineResult<T> = Result<T, EngineError>;

/// Reject negative, NaN or infinite balances
pub fn validate_balance(balance: f64) -> EngineResult<()> {
    if !balance.is_finite() || balance < 0.0 {
        return Err(EngineError::InvalidBalance { balance });
    }
    Ok(())
}

/// Reject bet percentages outside [0, 100]
pub fn validate_bet_percentage(percentage: f64) -> EngineResult<()> {
    if !(0.0..=100.0).contains(&percentage) {
        return Err(EngineError::InvalidBetPercentage { percentage });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_balance() {
        assert!(validate_balance(0.0).is_ok());
        assert!(validate_balance(1000.0).is_ok());
        assert!(validate_balance(-0.01).is_err());
        assert!(validate_balance(f64::NAN).is_err());
        assert!(validate_balance(f64::INFINITY).is_err());
    }

    #[test]
    fn test_validate_bet_percentage() {
        assert!(validate_bet_percentage(0.0).is_ok());
        assert!(validate_bet_percentage(2.5).is_ok());
        assert!(validate_bet_percentage(100.0).is_ok());
        assert!(validate_bet_percentage(-1.0).is_err());
        assert!(validate_bet_percentage(100.1).is_err());
        assert!(validate_bet_percentage(f64::NAN).is_err());
    }

    #[test]
    fn test_error_display() {
        let err = EngineError::MalformedGame {
            game_id: "nba-1".to_string(),
            reason: "missing home odds".to_string(),
        };
        assert!(err.to_string().contains("nba-1"));
        assert!(err.to_string().contains("missing home odds"));
    }
}
