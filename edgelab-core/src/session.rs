//! Session splitting — grouping an ordered bar series into trading days.

use chrono::NaiveDate;

use crate::domain::Bar;
use crate::filters::SessionType;

/// One trading day's bars, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub struct TradingDay {
    pub date: NaiveDate,
    pub bars: Vec<Bar>,
}

impl TradingDay {
    /// Direction of the session: close of the last bar vs open of the first.
    pub fn session_type(&self) -> Option<SessionType> {
        let first = self.bars.first()?;
        let last = self.bars.last()?;
        Some(SessionType::classify(first.open, last.close))
    }
}

/// Group an ordered bar series into sessions by UTC calendar date.
///
/// Input bars must be chronological; consecutive runs of the same date
/// form one session. Missing days are simply absent.
pub fn split_sessions(bars: &[Bar]) -> Vec<TradingDay> {
    let mut days: Vec<TradingDay> = Vec::new();

    for bar in bars {
        let date = bar.session_date();
        match days.last_mut() {
            Some(day) if day.date == date => day.bars.push(bar.clone()),
            _ => days.push(TradingDay {
                date,
                bars: vec![bar.clone()],
            }),
        }
    }

    days
}
