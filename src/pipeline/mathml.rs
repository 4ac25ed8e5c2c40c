//! LaTeX → MathML rendering for [`crate::config::MathMode::Markup`].
//!
//! A small recursive-descent parser over the subset of LaTeX that shows up
//! in extracted course material: groups, fractions, roots, sub/superscripts,
//! Greek letters, common operators and relations, named functions and
//! `\text{…}`. Anything outside that subset is a [`MathParseError`], and so
//! is nesting deeper than [`MAX_DEPTH`]; the caller turns either into a
//! raw-LaTeX fallback rather than guessing.
//!
//! ```text
//! expr  := term*
//! term  := atom ( ("^" | "_") atom )*
//! atom  := "{" expr "}" | number | letter | operator | "\" command
//! ```

use crate::error::MathParseError;
use crate::pipeline::render::escape_html;

const MATHML_NS: &str = "http://www.w3.org/1998/Math/MathML";

/// Deepest group nesting the parser descends into.
pub const MAX_DEPTH: usize = 256;

/// Render one span's content as a `<math>` element.
pub fn render(latex: &str, block: bool) -> Result<String, MathParseError> {
    let mut parser = Parser::new(latex);
    let body = parser.parse_expr(None)?;
    if body.is_empty() {
        return Err(MathParseError::Empty);
    }
    let display = if block { "block" } else { "inline" };
    Ok(format!(
        "<math xmlns=\"{MATHML_NS}\" display=\"{display}\"><mrow>{}</mrow></math>",
        body.concat()
    ))
}

struct Parser<'a> {
    src: &'a str,
    chars: Vec<(usize, char)>,
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            chars: src.char_indices().collect(),
            pos: 0,
            depth: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).map(|&(_, c)| c)
    }

    fn offset(&self) -> usize {
        self.chars
            .get(self.pos)
            .map(|&(i, _)| i)
            .unwrap_or(self.src.len())
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    /// Parse terms until `close` (consumed) or end of input.
    fn parse_expr(&mut self, close: Option<usize>) -> Result<Vec<String>, MathParseError> {
        let mut nodes = Vec::new();
        loop {
            self.skip_ws();
            match self.peek() {
                None => {
                    return match close {
                        Some(open_at) => Err(MathParseError::UnbalancedBraces(open_at)),
                        None => Ok(nodes),
                    };
                }
                Some('}') => {
                    if close.is_some() {
                        self.pos += 1;
                        return Ok(nodes);
                    }
                    return Err(MathParseError::UnbalancedBraces(self.offset()));
                }
                Some(_) => {
                    if let Some(node) = self.parse_term()? {
                        nodes.push(node);
                    }
                }
            }
        }
    }

    fn parse_term(&mut self) -> Result<Option<String>, MathParseError> {
        let base = match self.parse_atom()? {
            Some(node) => node,
            None => return Ok(None),
        };

        let mut sub = None;
        let mut sup = None;
        loop {
            self.skip_ws();
            match self.peek() {
                Some('_') if sub.is_none() => {
                    self.pos += 1;
                    sub = Some(self.parse_script_arg("_")?);
                }
                Some('^') if sup.is_none() => {
                    self.pos += 1;
                    sup = Some(self.parse_script_arg("^")?);
                }
                _ => break,
            }
        }

        Ok(Some(match (sub, sup) {
            (None, None) => base,
            (Some(b), None) => format!("<msub>{base}{b}</msub>"),
            (None, Some(p)) => format!("<msup>{base}{p}</msup>"),
            (Some(b), Some(p)) => format!("<msubsup>{base}{b}{p}</msubsup>"),
        }))
    }

    fn parse_script_arg(&mut self, which: &str) -> Result<String, MathParseError> {
        self.skip_ws();
        match self.peek() {
            None | Some('}') | Some('^') | Some('_') => {
                Err(MathParseError::MissingArgument(which.to_string()))
            }
            _ => self
                .parse_atom()?
                .ok_or_else(|| MathParseError::MissingArgument(which.to_string())),
        }
    }

    /// A single braced group or token, as one MathML node.
    fn parse_group_arg(&mut self, command: &str) -> Result<String, MathParseError> {
        self.skip_ws();
        match self.peek() {
            None | Some('}') => Err(MathParseError::MissingArgument(command.to_string())),
            _ => self
                .parse_atom()?
                .ok_or_else(|| MathParseError::MissingArgument(command.to_string())),
        }
    }

    /// Every nested construct (groups, command arguments, scripts) recurses
    /// through here, so this is where nesting depth is bounded.
    fn parse_atom(&mut self) -> Result<Option<String>, MathParseError> {
        if self.depth >= MAX_DEPTH {
            return Err(MathParseError::TooDeep(self.offset()));
        }
        self.depth += 1;
        let atom = self.parse_atom_inner();
        self.depth -= 1;
        atom
    }

    fn parse_atom_inner(&mut self) -> Result<Option<String>, MathParseError> {
        self.skip_ws();
        let at = self.offset();
        let c = match self.peek() {
            Some(c) => c,
            None => return Ok(None),
        };

        match c {
            '{' => {
                self.pos += 1;
                let inner = self.parse_expr(Some(at))?;
                Ok(Some(format!("<mrow>{}</mrow>", inner.concat())))
            }
            '\\' => {
                self.pos += 1;
                self.parse_command()
            }
            '0'..='9' | '.' => Ok(Some(self.parse_number())),
            c if c.is_alphabetic() => {
                self.pos += 1;
                Ok(Some(format!("<mi>{}</mi>", escape_html(&c.to_string()))))
            }
            '+' | '-' | '=' | '<' | '>' | ',' | '(' | ')' | '[' | ']' | '|' | '/' | '!'
            | '\'' | ':' | ';' | '*' => {
                self.pos += 1;
                let op = match c {
                    '-' => "\u{2212}".to_string(),
                    '*' => "\u{2217}".to_string(),
                    other => escape_html(&other.to_string()),
                };
                Ok(Some(format!("<mo>{op}</mo>")))
            }
            other => Err(MathParseError::UnexpectedToken(other, at)),
        }
    }

    fn parse_number(&mut self) -> String {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_digit() || c == '.')
        {
            self.pos += 1;
        }
        let digits: String = self.chars[start..self.pos].iter().map(|&(_, c)| c).collect();
        format!("<mn>{digits}</mn>")
    }

    fn parse_command(&mut self) -> Result<Option<String>, MathParseError> {
        // Single-character commands: \{ \} \, \; \! \  \|
        match self.peek() {
            Some('{') | Some('}') | Some('|') => {
                let c = self.bump().unwrap_or('|');
                let op = if c == '|' { "\u{2016}".to_string() } else { c.to_string() };
                return Ok(Some(format!("<mo>{op}</mo>")));
            }
            Some(',') | Some(';') | Some('!') | Some(' ') | Some(':') => {
                self.pos += 1;
                return Ok(None);
            }
            Some(c) if c.is_ascii_alphabetic() => {}
            Some(c) => return Err(MathParseError::UnexpectedToken(c, self.offset())),
            None => return Err(MathParseError::MissingArgument(String::new())),
        }

        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_alphabetic()) {
            self.pos += 1;
        }
        let name: String = self.chars[start..self.pos].iter().map(|&(_, c)| c).collect();

        match name.as_str() {
            "frac" | "dfrac" | "tfrac" => {
                let num = self.parse_group_arg(&name)?;
                let den = self.parse_group_arg(&name)?;
                Ok(Some(format!("<mfrac>{num}{den}</mfrac>")))
            }
            "sqrt" => {
                self.skip_ws();
                if self.peek() == Some('[') {
                    self.pos += 1;
                    let index = self.parse_until_bracket()?;
                    let radicand = self.parse_group_arg(&name)?;
                    Ok(Some(format!(
                        "<mroot>{radicand}<mrow>{}</mrow></mroot>",
                        index.concat()
                    )))
                } else {
                    let radicand = self.parse_group_arg(&name)?;
                    Ok(Some(format!("<msqrt>{radicand}</msqrt>")))
                }
            }
            "left" | "right" => {
                self.skip_ws();
                match self.bump() {
                    Some('.') => Ok(None),
                    Some('\\') => {
                        let fence = match self.bump() {
                            Some('{') => "{",
                            Some('}') => "}",
                            Some('|') => "\u{2016}",
                            _ => return Err(MathParseError::MissingArgument(name.clone())),
                        };
                        Ok(Some(format!("<mo stretchy=\"true\">{fence}</mo>")))
                    }
                    Some(c) if "()[]|<>/".contains(c) => Ok(Some(format!(
                        "<mo stretchy=\"true\">{}</mo>",
                        escape_html(&c.to_string())
                    ))),
                    _ => Err(MathParseError::MissingArgument(name.clone())),
                }
            }
            "text" | "mathrm" | "textrm" | "textit" | "mbox" | "operatorname" => {
                self.skip_ws();
                let open_at = self.offset();
                if self.bump() != Some('{') {
                    return Err(MathParseError::MissingArgument(name.clone()));
                }
                let raw = self.raw_until_close(open_at)?;
                let tag = if name == "operatorname" { "mi" } else { "mtext" };
                Ok(Some(format!("<{tag}>{}</{tag}>", escape_html(&raw))))
            }
            "quad" | "qquad" | "displaystyle" | "textstyle" | "limits" | "nolimits" => Ok(None),
            other => {
                if let Some(glyph) = identifier_glyph(other) {
                    Ok(Some(format!("<mi>{glyph}</mi>")))
                } else if let Some(glyph) = operator_glyph(other) {
                    Ok(Some(format!("<mo>{glyph}</mo>")))
                } else if NAMED_FUNCTIONS.contains(&other) {
                    Ok(Some(format!("<mi>{other}</mi>")))
                } else {
                    Err(MathParseError::UnknownCommand(other.to_string()))
                }
            }
        }
    }

    /// Parse a `\sqrt[...]` index up to the closing bracket.
    fn parse_until_bracket(&mut self) -> Result<Vec<String>, MathParseError> {
        let open_at = self.offset();
        let mut nodes = Vec::new();
        loop {
            self.skip_ws();
            match self.peek() {
                None => return Err(MathParseError::UnbalancedBraces(open_at)),
                Some(']') => {
                    self.pos += 1;
                    return Ok(nodes);
                }
                Some(_) => {
                    if let Some(node) = self.parse_term()? {
                        nodes.push(node);
                    }
                }
            }
        }
    }

    /// Raw text up to the brace matching an already-consumed `{`.
    fn raw_until_close(&mut self, open_at: usize) -> Result<String, MathParseError> {
        let mut depth = 1usize;
        let mut raw = String::new();
        while let Some(c) = self.bump() {
            match c {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(raw);
                    }
                }
                _ => {}
            }
            raw.push(c);
        }
        Err(MathParseError::UnbalancedBraces(open_at))
    }
}

const NAMED_FUNCTIONS: &[&str] = &[
    "sin", "cos", "tan", "cot", "sec", "csc", "arcsin", "arccos", "arctan", "sinh", "cosh",
    "tanh", "log", "ln", "exp", "lim", "max", "min", "sup", "inf", "det", "gcd",
];

fn identifier_glyph(name: &str) -> Option<&'static str> {
    Some(match name {
        "alpha" => "\u{3b1}",
        "beta" => "\u{3b2}",
        "gamma" => "\u{3b3}",
        "delta" => "\u{3b4}",
        "epsilon" | "varepsilon" => "\u{3b5}",
        "zeta" => "\u{3b6}",
        "eta" => "\u{3b7}",
        "theta" => "\u{3b8}",
        "iota" => "\u{3b9}",
        "kappa" => "\u{3ba}",
        "lambda" => "\u{3bb}",
        "mu" => "\u{3bc}",
        "nu" => "\u{3bd}",
        "xi" => "\u{3be}",
        "pi" => "\u{3c0}",
        "rho" => "\u{3c1}",
        "sigma" => "\u{3c3}",
        "tau" => "\u{3c4}",
        "phi" | "varphi" => "\u{3c6}",
        "chi" => "\u{3c7}",
        "psi" => "\u{3c8}",
        "omega" => "\u{3c9}",
        "Gamma" => "\u{393}",
        "Delta" => "\u{394}",
        "Theta" => "\u{398}",
        "Lambda" => "\u{39b}",
        "Pi" => "\u{3a0}",
        "Sigma" => "\u{3a3}",
        "Phi" => "\u{3a6}",
        "Omega" => "\u{3a9}",
        "infty" => "\u{221e}",
        "partial" => "\u{2202}",
        "nabla" => "\u{2207}",
        _ => return None,
    })
}

fn operator_glyph(name: &str) -> Option<&'static str> {
    Some(match name {
        "sum" => "\u{2211}",
        "prod" => "\u{220f}",
        "int" => "\u{222b}",
        "oint" => "\u{222e}",
        "cdot" => "\u{22c5}",
        "times" => "\u{d7}",
        "div" => "\u{f7}",
        "pm" => "\u{b1}",
        "mp" => "\u{2213}",
        "leq" | "le" => "\u{2264}",
        "geq" | "ge" => "\u{2265}",
        "neq" | "ne" => "\u{2260}",
        "approx" => "\u{2248}",
        "equiv" => "\u{2261}",
        "sim" => "\u{223c}",
        "propto" => "\u{221d}",
        "to" | "rightarrow" => "\u{2192}",
        "leftarrow" => "\u{2190}",
        "Rightarrow" | "implies" => "\u{21d2}",
        "iff" | "Leftrightarrow" => "\u{21d4}",
        "in" => "\u{2208}",
        "notin" => "\u{2209}",
        "subset" => "\u{2282}",
        "subseteq" => "\u{2286}",
        "cup" => "\u{222a}",
        "cap" => "\u{2229}",
        "forall" => "\u{2200}",
        "exists" => "\u{2203}",
        "cdots" => "\u{22ef}",
        "ldots" | "dots" => "\u{2026}",
        "angle" => "\u{2220}",
        "perp" => "\u{22a5}",
        "circ" => "\u{2218}",
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deep_nesting_is_an_error_not_a_crash() {
        let deep = format!("{}x{}", "{".repeat(10_000), "}".repeat(10_000));
        assert!(matches!(render(&deep, false), Err(MathParseError::TooDeep(_))));

        let fracs = format!("{}1", r"\frac".repeat(10_000));
        assert!(matches!(render(&fracs, false), Err(MathParseError::TooDeep(_))));
    }

    #[test]
    fn test_nesting_within_limit_renders() {
        let ok = format!("{}x{}", "{".repeat(100), "}".repeat(100));
        assert!(render(&ok, false).unwrap().contains("<mi>x</mi>"));
    }

    #[test]
    fn test_fraction() {
        let out = render(r"\frac{1}{2}", false).unwrap();
        assert_eq!(
            out,
            "<math xmlns=\"http://www.w3.org/1998/Math/MathML\" display=\"inline\">\
             <mrow><mfrac><mrow><mn>1</mn></mrow><mrow><mn>2</mn></mrow></mfrac></mrow></math>"
        );
    }

    #[test]
    fn test_block_display() {
        let out = render("x", true).unwrap();
        assert!(out.contains("display=\"block\""));
    }

    #[test]
    fn test_scripts() {
        let out = render("x_{i}^{2}", false).unwrap();
        assert!(
            out.contains("<msubsup><mi>x</mi><mrow><mi>i</mi></mrow><mrow><mn>2</mn></mrow></msubsup>"),
            "got: {out}"
        );
        let out = render("e^x", false).unwrap();
        assert!(out.contains("<msup><mi>e</mi><mi>x</mi></msup>"), "got: {out}");
    }

    #[test]
    fn test_sqrt_and_root() {
        assert!(render(r"\sqrt{2}", false).unwrap().contains("<msqrt>"));
        let out = render(r"\sqrt[3]{8}", false).unwrap();
        assert!(out.contains("<mroot><mrow><mn>8</mn></mrow><mrow><mn>3</mn></mrow></mroot>"));
    }

    #[test]
    fn test_greek_and_operators() {
        let out = render(r"\alpha \cdot \beta \leq \pi", false).unwrap();
        assert!(out.contains("<mi>\u{3b1}</mi>"));
        assert!(out.contains("<mo>\u{22c5}</mo>"));
        assert!(out.contains("<mo>\u{2264}</mo>"));
        assert!(out.contains("<mi>\u{3c0}</mi>"));
    }

    #[test]
    fn test_relation_escaped() {
        let out = render("a < b", false).unwrap();
        assert!(out.contains("<mo>&lt;</mo>"));
    }

    #[test]
    fn test_text_command() {
        let out = render(r"\text{area} = a^2", false).unwrap();
        assert!(out.contains("<mtext>area</mtext>"));
    }

    #[test]
    fn test_left_right() {
        let out = render(r"\left( x \right)", false).unwrap();
        assert_eq!(out.matches("stretchy=\"true\"").count(), 2);
    }

    #[test]
    fn test_unknown_command_is_error() {
        assert_eq!(
            render(r"\foo{x}", false),
            Err(MathParseError::UnknownCommand("foo".into()))
        );
    }

    #[test]
    fn test_unbalanced_braces() {
        assert!(matches!(
            render(r"\frac{1}{2", false),
            Err(MathParseError::UnbalancedBraces(_))
        ));
        assert!(matches!(
            render("x}", false),
            Err(MathParseError::UnbalancedBraces(1))
        ));
    }

    #[test]
    fn test_missing_argument() {
        assert_eq!(
            render("x^", false),
            Err(MathParseError::MissingArgument("^".into()))
        );
        assert_eq!(
            render(r"\frac{1}", false),
            Err(MathParseError::MissingArgument("frac".into()))
        );
    }

    #[test]
    fn test_empty_and_alignment_rejected() {
        assert_eq!(render("   ", false), Err(MathParseError::Empty));
        assert!(matches!(
            render("a & b", false),
            Err(MathParseError::UnexpectedToken('&', 2))
        ));
    }
}
