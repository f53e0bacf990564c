#[cfg(test)]
#[path = "slash_commands_test.rs"]
mod tests;

pub struct SlashCommand {
    command: String,
    pub args: Vec<String>,
}

impl SlashCommand {
    pub fn parse(text: &str) -> Option<SlashCommand> {
        let mut args = text
            .trim()
            .split(' ')
            .filter(|e| return !e.is_empty())
            .map(|e| return e.to_string())
            .collect::<Vec<String>>();
        if args.is_empty() {
            return None;
        }
        let prefix = args[0].to_string();
        args.remove(0);

        let cmd = SlashCommand {
            command: prefix,
            args,
        };
        if cmd.is_quit()
            || cmd.is_new_session()
            || cmd.is_open_session()
            || cmd.is_list_sessions()
            || cmd.is_delete_session()
            || cmd.is_rename_session()
            || cmd.is_edit_message()
            || cmd.is_delete_message()
            || cmd.is_regenerate()
            || cmd.is_template()
            || cmd.is_analyze_ats()
            || cmd.is_analyze_breakdown()
            || cmd.is_draft()
            || cmd.is_model_list()
            || cmd.is_help()
        {
            return Some(cmd);
        }

        return None;
    }

    /// Everything from `args[idx]` onwards rejoined as free text.
    pub fn rest_from(&self, idx: usize) -> String {
        if idx >= self.args.len() {
            return "".to_string();
        }

        return self.args[idx..].join(" ");
    }

    pub fn is_quit(&self) -> bool {
        return ["/q", "/quit", "/exit"].contains(&self.command.as_str());
    }

    pub fn is_new_session(&self) -> bool {
        return ["/n", "/new"].contains(&self.command.as_str());
    }

    pub fn is_open_session(&self) -> bool {
        return ["/o", "/open"].contains(&self.command.as_str());
    }

    pub fn is_list_sessions(&self) -> bool {
        return ["/s", "/sessions"].contains(&self.command.as_str());
    }

    pub fn is_delete_session(&self) -> bool {
        return ["/delete"].contains(&self.command.as_str());
    }

    pub fn is_rename_session(&self) -> bool {
        return ["/rename"].contains(&self.command.as_str());
    }

    pub fn is_edit_message(&self) -> bool {
        return ["/e", "/edit"].contains(&self.command.as_str());
    }

    pub fn is_delete_message(&self) -> bool {
        return ["/delmsg"].contains(&self.command.as_str());
    }

    pub fn is_regenerate(&self) -> bool {
        return ["/r", "/regen"].contains(&self.command.as_str());
    }

    pub fn is_template(&self) -> bool {
        return ["/t", "/template"].contains(&self.command.as_str());
    }

    pub fn is_analyze_ats(&self) -> bool {
        return ["/ats"].contains(&self.command.as_str());
    }

    pub fn is_analyze_breakdown(&self) -> bool {
        return ["/jd", "/breakdown"].contains(&self.command.as_str());
    }

    pub fn is_draft(&self) -> bool {
        return ["/draft"].contains(&self.command.as_str());
    }

    pub fn is_model_list(&self) -> bool {
        return ["/ml", "/modellist"].contains(&self.command.as_str());
    }

    pub fn is_help(&self) -> bool {
        return ["/h", "/help"].contains(&self.command.as_str());
    }
}
