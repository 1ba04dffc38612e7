/// Invoice number suggestion.
///
/// Numbers have the shape `{prefix}{sequential}` with the sequential part
/// zero-padded, e.g. "INV-0001", "INV-0002". A sequence can be seeded from
/// the last number a tenant used; the backend remains the authority on
/// whether a suggested number is actually free.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceNumberSequence {
    prefix: String,
    next_number: u64,
    zero_pad: usize,
}

impl InvoiceNumberSequence {
    /// Create a new sequence starting at 1.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self::starting_at(prefix, 1)
    }

    /// Create a sequence continuing from a given number.
    pub fn starting_at(prefix: impl Into<String>, next_number: u64) -> Self {
        Self {
            prefix: prefix.into(),
            next_number,
            zero_pad: 4,
        }
    }

    /// Continue after the last used number: "INV-0041" → next is "INV-0042".
    ///
    /// The trailing digits are the counter and everything before them is the
    /// prefix; the padding width is taken from the digits. Without trailing
    /// digits the whole string becomes the prefix and counting starts at 1.
    pub fn after(last_number: &str) -> Self {
        let digits_start = last_number
            .char_indices()
            .rev()
            .take_while(|(_, c)| c.is_ascii_digit())
            .last()
            .map(|(i, _)| i);

        match digits_start {
            Some(start) => {
                let digits = &last_number[start..];
                let last = digits.parse::<u64>().unwrap_or(0);
                Self {
                    prefix: last_number[..start].to_string(),
                    next_number: last.saturating_add(1),
                    zero_pad: digits.len(),
                }
            }
            None => Self::new(last_number),
        }
    }

    /// Set zero-padding width (default: 4, so "0001").
    pub fn with_padding(mut self, width: usize) -> Self {
        self.zero_pad = width;
        self
    }

    /// Generate the next invoice number.
    pub fn next_number(&mut self) -> String {
        let number = self.peek();
        self.next_number = self.next_number.saturating_add(1);
        number
    }

    /// Preview the next number without consuming it.
    pub fn peek(&self) -> String {
        format!(
            "{}{:0>width$}",
            self.prefix,
            self.next_number,
            width = self.zero_pad
        )
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Get the next number that will be issued (without prefix/formatting).
    pub fn next_raw(&self) -> u64 {
        self.next_number
    }
}
