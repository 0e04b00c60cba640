/// Identifies one fetch issued by a screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FetchToken(u64);

/// Hands out increasing fetch tokens. Only the latest token may update the
/// screen; anything older finished after it was superseded.
#[derive(Debug, Default)]
pub struct FetchSequencer {
    latest: u64,
}

impl FetchSequencer {
    pub fn issue(&mut self) -> FetchToken {
        self.latest += 1;
        FetchToken(self.latest)
    }

    pub fn is_latest(&self, token: FetchToken) -> bool {
        token.0 == self.latest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_newest_token_is_current() {
        let mut seq = FetchSequencer::default();
        let first = seq.issue();
        assert!(seq.is_latest(first));
        let second = seq.issue();
        assert!(second > first);
        assert!(!seq.is_latest(first));
        assert!(seq.is_latest(second));
    }
}
