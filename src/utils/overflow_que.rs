use std::collections::VecDeque;

/// FIFO of payload fragments waiting for room in the outstanding window.
pub struct OverflowQue {
    queue: VecDeque<Vec<u8>>,
    len_cap: usize,
}

impl OverflowQue {
    fn check_rep(&self) {
        assert!(self.queue.len() <= self.len_cap);
    }

    #[must_use]
    pub fn new(len_cap: usize) -> Self {
        let this = OverflowQue {
            queue: VecDeque::new(),
            len_cap,
        };
        this.check_rep();
        this
    }

    pub fn push_back(&mut self, frag: Vec<u8>) -> Result<(), PushError<Vec<u8>>> {
        if self.is_full() {
            return Err(PushError(frag));
        }
        self.queue.push_back(frag);
        self.check_rep();
        Ok(())
    }

    #[must_use]
    pub fn pop_front(&mut self) -> Option<Vec<u8>> {
        let frag = self.queue.pop_front();
        self.check_rep();
        frag
    }

    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    #[must_use]
    #[inline]
    pub fn is_full(&self) -> bool {
        self.queue.len() >= self.len_cap
    }

    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.queue.len()
    }
}

#[derive(Debug)]
pub struct PushError<T>(pub T);
