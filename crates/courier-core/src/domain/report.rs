use serde::{Deserialize, Serialize};

/// drain 呼び出しの終わり方
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrainOutcome {
    /// pending のスナップショットを最後まで処理した（何も無かった場合を含む）
    Completed,

    /// ネットワークが到達不可になったので止めた
    Unreachable,

    /// 別の drain が走行中だった。通常はその drain がもう 1 パス回る
    Coalesced,
}

/// drain 呼び出し 1 回分（全パス）の集計
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrainReport {
    pub outcome: DrainOutcome,
    pub passes: u32,
    pub sent: usize,
    pub failed: usize,
    pub discarded: usize,
}

impl DrainReport {
    pub fn new(outcome: DrainOutcome) -> Self {
        Self {
            outcome,
            passes: 0,
            sent: 0,
            failed: 0,
            discarded: 0,
        }
    }

    pub fn coalesced() -> Self {
        Self::new(DrainOutcome::Coalesced)
    }

    /// この呼び出しで解決した件数（送信・巻き戻し・破棄）
    pub fn resolved(&self) -> usize {
        self.sent + self.failed + self.discarded
    }

    /// 後のパスを畳み込む。outcome は後のものが勝つ
    pub fn absorb(&mut self, pass: DrainReport) {
        self.outcome = pass.outcome;
        self.passes += pass.passes;
        self.sent += pass.sent;
        self.failed += pass.failed;
        self.discarded += pass.discarded;
    }
}
