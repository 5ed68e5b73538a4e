use crate::dictionary::Candidate;

///
/// 変換候補リスト上のカーソル。
///
/// Candidates before `pagination_start` are shown one by one in the preedit. From `pagination_start` on,
/// they are shown `page_size` at a time in a list, pages starting at `pagination_start + n * page_size`.
///
#[derive(Debug, Clone)]
pub(crate) struct CandidateSelector {
    candidates: Vec<Candidate>,
    // None: 未選択
    index: Option<usize>,
    page_size: usize,
    pagination_start: usize,
}

impl CandidateSelector {
    pub(crate) fn new(page_size: usize, pagination_start: usize) -> Self {
        CandidateSelector {
            candidates: vec![],
            index: None,
            page_size: page_size.max(1),
            pagination_start,
        }
    }

    pub(crate) fn set_candidates(&mut self, candidates: Vec<Candidate>) {
        self.candidates = candidates;
        self.index = None;
    }

    pub(crate) fn clear(&mut self) {
        self.set_candidates(vec![]);
    }

    pub(crate) fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub(crate) fn index(&self) -> Option<usize> {
        self.index
    }

    pub(crate) fn pagination_start(&self) -> usize {
        self.pagination_start
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Index out of the list means nothing selected.
    pub(crate) fn set_index(&mut self, index: usize) -> Option<Candidate> {
        self.index = if index < self.candidates.len() {
            Some(index)
        } else {
            None
        };
        self.candidate()
    }

    fn set_index_isize(&mut self, index: isize) -> Option<Candidate> {
        if index < 0 {
            self.index = None;
            return None;
        }
        self.set_index(index as usize)
    }

    ///
    /// 次の候補へ。move_over_pagesの場合、リスト表示中は次のページの先頭へ移る。
    /// 末尾を越えたら未選択になる。
    ///
    pub(crate) fn next_candidate(&mut self, move_over_pages: bool) -> Option<Candidate> {
        let next = match self.index {
            None => 0,
            Some(index) if move_over_pages && index >= self.pagination_start => {
                let next = (index + self.page_size) as isize;
                next - self.offset_in_page(next)
            }
            Some(index) => index as isize + 1,
        };
        self.set_index_isize(next)
    }

    /// 前の候補へ。先頭を越えたら未選択になる。
    /// move_over_pagesの場合、最初のページからは一つ前のページ境界が負になるので、
    /// インラインの候補には戻らずに未選択になる。
    pub(crate) fn previous_candidate(&mut self, move_over_pages: bool) -> Option<Candidate> {
        let previous = match self.index {
            None => return None,
            Some(index) if move_over_pages && index >= self.pagination_start => {
                let previous = index as isize - self.page_size as isize;
                previous - self.offset_in_page(previous)
            }
            Some(index) => index as isize - 1,
        };
        self.set_index_isize(previous)
    }

    fn offset_in_page(&self, index: isize) -> isize {
        (index - self.pagination_start as isize).rem_euclid(self.page_size as isize)
    }

    /// The selected candidate, to be recorded on commit.
    pub(crate) fn candidate(&self) -> Option<Candidate> {
        let mut candidate = self.candidates.get(self.index?)?.clone();
        candidate.persistable = true;
        Some(candidate)
    }

    /// Index of the first candidate on the page shown. None while candidates are shown inline.
    pub(crate) fn page_start(&self) -> Option<usize> {
        let index = self.index?;
        if index < self.pagination_start {
            return None;
        }
        Some(index - (index - self.pagination_start) % self.page_size)
    }

    /// Candidates on the page shown, empty while candidates are shown inline.
    pub(crate) fn page(&self) -> &[Candidate] {
        match self.page_start() {
            Some(start) => {
                let end = (start + self.page_size).min(self.candidates.len());
                &self.candidates[start..end]
            }
            None => &[],
        }
    }

    /// position-th candidate on the page shown.
    pub(crate) fn select_on_page(&mut self, position: usize) -> Option<Candidate> {
        let start = self.page_start()?;
        if position >= self.page_size || start + position >= self.candidates.len() {
            return None;
        }
        self.set_index(start + position)
    }
}
