use flex_error::define_error;

define_error! {
    ValidationError {
        Empty
            |_| { "identifier cannot be blank" },

        InvalidLength
            {
                id: String,
                length: usize,
                min: usize,
                max: usize,
            }
            |e| {
                format!("identifier `{}` has invalid length {}; must be between {} and {} characters",
                    e.id, e.length, e.min, e.max)
            },

        InvalidCharacter
            { id: String }
            |e| {
                format!("identifier `{}` must only contain alphanumeric characters or `.`, `_`, `+`, `-`, `#`, `[`, `]`, `<`, `>`",
                    e.id)
            },

        ContainsSeparator
            { id: String }
            |e| { format!("identifier `{}` cannot contain the path separator `/`", e.id) },

        ZeroHeight
            |_| { "a revision height of zero is not a valid chain height" },

        EmptyProof
            |_| { "proof bytes cannot be empty" },

        InvalidTimestamp
            { nanoseconds: u64 }
            |e| { format!("timestamp of {} nanoseconds is out of range", e.nanoseconds) },
    }
}
