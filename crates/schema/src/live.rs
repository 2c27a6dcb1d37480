use ffbb_core::Timestamp;

use crate::enums::LiveStatus;

record! {
    /// Entry of the live-scoring feed.
    pub struct Live as "Live" {
        match_id: String = "matchId" (id),
        competition_name: Option<String> = "competitionAbgName" (opt),
        team_home: Option<String> = "teamName_home" (opt),
        team_out: Option<String> = "teamName_out" (opt),
        score_home: Option<i64> = "score_home" (opt),
        score_out: Option<i64> = "score_out" (opt),
        status: Option<LiveStatus> = "currentStatus" (opt),
        period: Option<i64> = "currentPeriod" (opt),
        clock: Option<String> = "clock" (opt),
        match_time: Option<Timestamp> = "matchTime" (opt),
        periods: Option<Vec<LiveScore>> = "periods" (opt),
    }
}

record! {
    /// Score of one period.
    pub struct LiveScore as "LiveScore" {
        period: Option<i64> = "period" (opt),
        score_home: Option<i64> = "score_home" (opt),
        score_out: Option<i64> = "score_out" (opt),
    }
}

impl Live {
    pub fn title(&self) -> String {
        format!("{} vs {}", self.team_home.as_deref().unwrap_or("?"), self.team_out.as_deref().unwrap_or("?"))
    }

    /// `72 - 65`, or `-` while either score is unknown.
    pub fn score_line(&self) -> String {
        match (self.score_home, self.score_out) {
            (Some(h), Some(o)) => format!("{h} - {o}"),
            _ => "-".to_string(),
        }
    }

    pub fn is_finished(&self) -> bool { matches!(self.status, Some(LiveStatus::Finished)) }
}
