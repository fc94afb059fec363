use std::fmt;
use std::time::Duration;

/// 페이지 완료 시점의 진행 상태. 순수 계산만 하며 I/O 없음
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressReport {
    /// 진행 백분율 (0 ~ 100)
    pub percent: f64,
    /// 마지막 페이지 순간 처리율 (레코드/초)
    pub page_rate: Option<f64>,
    /// 누적 평균 처리율 (레코드/초)
    pub avg_rate: Option<f64>,
    /// 남은 예상 시간(초)
    pub eta_seconds: Option<f64>,
}

impl ProgressReport {
    /// 진행 상태 계산.
    /// total 0 과 경과시간 0 은 0 나누기 대신 완료/미상 처리
    pub fn compute(
        retrieved: u64,
        total: u64,
        total_elapsed: Duration,
        page_elapsed: Duration,
        batch_len: u64,
    ) -> Self {
        let percent = if total == 0 {
            100.0
        } else {
            ((retrieved as f64) * 100.0 / (total as f64)).min(100.0)
        };

        let page_rate = rate(batch_len, page_elapsed);
        let avg_rate = rate(retrieved, total_elapsed);

        let eta_seconds = avg_rate
            .filter(|r| *r > 0.0)
            .map(|r| total.saturating_sub(retrieved) as f64 / r);

        Self {
            percent,
            page_rate,
            avg_rate,
            eta_seconds,
        }
    }
}

/// 초당 처리율. 경과시간이 0 이면 미상
fn rate(count: u64, elapsed: Duration) -> Option<f64> {
    let secs = elapsed.as_secs_f64();
    if secs <= 0.0 {
        return None;
    }
    Some(count as f64 / secs)
}

impl fmt::Display for ProgressReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "진행률 {:.0}%", self.percent)?;

        match self.page_rate {
            Some(rate) => write!(f, ", 페이지 {rate:.1} 레코드/초")?,
            None => write!(f, ", 페이지 처리율 미상")?,
        }
        match self.avg_rate {
            Some(rate) => write!(f, ", 평균 {rate:.1} 레코드/초")?,
            None => write!(f, ", 평균 처리율 미상")?,
        }
        if let Some(eta) = self.eta_seconds {
            write!(f, ", 남은 예상 {eta:.0}초")?;
        }

        Ok(())
    }
}
