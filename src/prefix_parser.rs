/// Whitespace-separated arguments that can also hand back the unconsumed
/// rest of the line verbatim.
#[derive(Debug, Clone)]
pub struct Arguments<'a> {
    remaining: &'a str,
}

impl<'a> Arguments<'a> {
    pub fn new(args_str: &'a str) -> Self {
        Arguments {
            remaining: args_str,
        }
    }

    pub fn remainder(&self) -> &'a str {
        self.remaining.trim()
    }
}

impl<'a> Iterator for Arguments<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        let rest = self.remaining.trim_start();
        if rest.is_empty() {
            self.remaining = "";
            return None;
        }

        let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        let (arg, after) = rest.split_at(end);
        self.remaining = after;
        Some(arg)
    }
}

#[derive(Debug, PartialEq)]
pub struct ParsedCommand<'a> {
    pub command: &'a str,
    args_part: &'a str,
}

impl<'a> ParsedCommand<'a> {
    /// Command names match case-insensitively.
    pub fn command_name(&self) -> String {
        self.command.to_lowercase()
    }

    pub fn arguments(&self) -> Arguments<'a> {
        Arguments::new(self.args_part)
    }
}

pub fn parse<'a>(message: &'a str, prefix: &str) -> Option<ParsedCommand<'a>> {
    let content_after_prefix = message.strip_prefix(prefix)?;
    let trimmed_content = content_after_prefix.trim_start();

    if trimmed_content.is_empty() {
        return None;
    }

    let mut parts = trimmed_content.splitn(2, char::is_whitespace);
    let command = parts.next()?;
    let args_part = parts.next().unwrap_or("").trim_end();

    Some(ParsedCommand { command, args_part })
}
