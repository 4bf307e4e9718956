//! Minimal POST form carrying the CSRF token.

/// A POST form. Obtained from [`CsrfGuard::form`](crate::CsrfGuard::form),
/// which embeds the token as its first hidden input.
#[derive(Clone)]
pub struct Form {
    action: Option<String>,
    hidden: Vec<(String, String)>,
}

impl Form {
    pub(crate) fn with_token(field_name: &str, token: &str) -> Self {
        let mut form = Self {
            action: None,
            hidden: Vec::new(),
        };
        form.add_hidden_input(field_name, token);
        form
    }

    /// Set the form action URL
    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    /// Add a hidden input to the form
    pub fn add_hidden_input(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.hidden.push((name.into(), value.into()));
        self
    }

    /// Add several hidden inputs to the form
    pub fn add_hidden_inputs<I, K, V>(&mut self, inputs: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (name, value) in inputs {
            self.add_hidden_input(name, value);
        }
        self
    }

    pub fn hidden_inputs(&self) -> &[(String, String)] {
        &self.hidden
    }

    /// Value of the first hidden input called `name`.
    pub fn hidden_value(&self, name: &str) -> Option<&str> {
        self.hidden
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Render the form with its hidden inputs.
    pub fn to_html(&self) -> String {
        let mut html = String::from("<form method=\"post\"");
        if let Some(action) = &self.action {
            html.push_str(&format!(" action=\"{}\"", encode_html_attribute(action)));
        }
        html.push('>');

        for (name, value) in &self.hidden {
            html.push_str(&hidden_input_html(name, value));
        }

        html.push_str("</form>");
        html
    }
}

/// HTML for a single hidden input.
pub fn hidden_input_html(name: &str, value: &str) -> String {
    format!(
        "<input type=\"hidden\" name=\"{}\" value=\"{}\">",
        encode_html_attribute(name),
        encode_html_attribute(value)
    )
}

fn encode_html_attribute(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}
