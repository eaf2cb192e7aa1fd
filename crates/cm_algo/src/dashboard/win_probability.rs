//! Vote share → win probability projection.

use serde::{Deserialize, Serialize};

use cm_core::params::{CurvePoint, WinBandBreakpoints};
use cm_core::rounding::clamp_finite;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum WinProbabilityBand {
    Critical,
    Competitive,
    Comfortable,
    Strong,
}

impl WinProbabilityBand {
    pub fn as_str(self) -> &'static str {
        match self {
            WinProbabilityBand::Critical => "Critical",
            WinProbabilityBand::Competitive => "Competitive",
            WinProbabilityBand::Comfortable => "Comfortable",
            WinProbabilityBand::Strong => "Strong",
        }
    }
}

/// Piecewise-linear interpolation through `curve`, result clamped to
/// `[0, 100]`. Shares outside the curve take the nearest end point.
pub fn win_probability_percent(vote_share_percent: f64, curve: &[CurvePoint]) -> f64 {
    let (first, last) = match (curve.first(), curve.last()) {
        (Some(f), Some(l)) => (*f, *l),
        _ => return 0.0,
    };
    let x = clamp_finite(vote_share_percent, 0.0, 100.0);
    if x <= first.vote_share {
        return clamp_finite(first.win_probability, 0.0, 100.0);
    }
    if x >= last.vote_share {
        return clamp_finite(last.win_probability, 0.0, 100.0);
    }
    for w in curve.windows(2) {
        let (a, b) = (w[0], w[1]);
        if x <= b.vote_share {
            let span = b.vote_share - a.vote_share;
            if span <= 0.0 {
                return clamp_finite(b.win_probability, 0.0, 100.0);
            }
            let t = (x - a.vote_share) / span;
            let y = a.win_probability + t * (b.win_probability - a.win_probability);
            return clamp_finite(y, 0.0, 100.0);
        }
    }
    clamp_finite(last.win_probability, 0.0, 100.0)
}

/// Lower bounds are inclusive.
pub fn win_probability_band(percent: f64, b: &WinBandBreakpoints) -> WinProbabilityBand {
    if percent >= b.strong {
        WinProbabilityBand::Strong
    } else if percent >= b.comfortable {
        WinProbabilityBand::Comfortable
    } else if percent >= b.competitive {
        WinProbabilityBand::Competitive
    } else {
        WinProbabilityBand::Critical
    }
}
