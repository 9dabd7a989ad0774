use crate::base::OpStatus;

#[derive(Debug, Display, Error, From)]
pub enum RiptideError {
    #[display("value is not an integer or out of range")]
    InvalidInt,

    #[display("unknown subcommand or wrong number of arguments for '{cmd}'. Try {family} HELP.")]
    UnknownSubCommand { cmd: String, family: &'static str },

    #[from]
    #[display("operation failed: {}", _0)]
    Op(#[error(not(source))] OpStatus),

    #[from]
    #[display("shard task failed: {}", _0)]
    TaskJoin(tokio::task::JoinError),
}

pub type RiptideResult<T> = Result<T, RiptideError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = RiptideError::UnknownSubCommand {
            cmd: "wat".to_string(),
            family: "MEMORY",
        };
        assert_eq!(
            err.to_string(),
            "unknown subcommand or wrong number of arguments for 'wat'. Try MEMORY HELP."
        );

        let err: RiptideError = OpStatus::SyntaxErr.into();
        assert_eq!(err.to_string(), "operation failed: syntax error");
    }
}
