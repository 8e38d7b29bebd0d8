//! Argument parsing for `atlas-search`.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchArgs {
    pub query: String,
    pub limit: Option<usize>,
}

impl SearchArgs {
    /// Positional words form the query; `--limit N` (or `-n N`) caps the hits.
    pub fn parse<I, S>(args: I) -> Result<Self, String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut words = Vec::new();
        let mut limit = None;
        let mut args = args.into_iter().map(Into::into);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--limit" | "-n" => {
                    let value = args.next().ok_or("--limit requires a number")?;
                    let n = value
                        .parse::<usize>()
                        .map_err(|_| format!("--limit requires a number, got '{value}'"))?;
                    limit = Some(n);
                }
                flag if flag.starts_with('-') && flag.len() > 1 => {
                    return Err(format!("unknown option '{flag}'"));
                }
                word => words.push(word.to_string()),
            }
        }

        let query = words.join(" ");
        if query.trim().is_empty() {
            return Err("missing query".to_string());
        }
        Ok(Self { query, limit })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_and_limit() {
        let args = SearchArgs::parse(["heart", "doctor", "--limit", "5"]).unwrap();
        assert_eq!(args, SearchArgs { query: "heart doctor".into(), limit: Some(5) });
    }

    #[test]
    fn limit_is_optional() {
        let args = SearchArgs::parse(["-n", "1", "cardiology"]).unwrap();
        assert_eq!(args.limit, Some(1));
        assert_eq!(SearchArgs::parse(["cardiology"]).unwrap().limit, None);
    }

    #[test]
    fn rejects_bad_input() {
        assert!(SearchArgs::parse(Vec::<String>::new()).is_err());
        assert!(SearchArgs::parse(["  "]).is_err());
        assert!(SearchArgs::parse(["heart", "--limit"]).is_err());
        assert!(SearchArgs::parse(["heart", "--limit", "many"]).is_err());
        assert!(SearchArgs::parse(["heart", "--verbose"]).is_err());
    }
}
