//! Lexer for rule-table lines
//!
//! Splits one line such as `8: 42 | 42 8` or `4: "a"` into tokens,
//! skipping whitespace.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Number(u32),
    /// Content between matching quotes, either `"..."` or `'...'`
    Literal(String),
    /// Any other run of non-space characters
    Word(String),
    Colon,
    Pipe,
    Eof,
}

pub struct Lexer {
    input: Vec<char>,
    pos: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            pos: 0,
        }
    }

    pub fn tokenize(&mut self) -> Result<Vec<Token>, String> {
        let mut tokens = Vec::new();

        while self.pos < self.input.len() {
            self.skip_whitespace();

            if self.pos >= self.input.len() {
                break;
            }

            let token = self.next_token()?;
            tokens.push(token);
        }

        tokens.push(Token::Eof);
        Ok(tokens)
    }

    fn skip_whitespace(&mut self) {
        while self.pos < self.input.len() && self.input[self.pos].is_whitespace() {
            self.pos += 1;
        }
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    fn next_token(&mut self) -> Result<Token, String> {
        match self.peek() {
            Some(quote @ ('"' | '\'')) => self.read_literal(quote),
            Some(':') => {
                self.advance();
                Ok(Token::Colon)
            }
            Some('|') => {
                self.advance();
                Ok(Token::Pipe)
            }
            Some(_) => self.read_word(),
            None => Err("Unexpected end of input".to_string()),
        }
    }

    /// Read a quoted literal; a doubled quote stands for the quote itself
    fn read_literal(&mut self, quote: char) -> Result<Token, String> {
        self.advance(); // skip opening quote
        let mut s = String::new();

        while let Some(ch) = self.peek() {
            self.advance();
            if ch != quote {
                s.push(ch);
                continue;
            }
            if self.peek() == Some(quote) {
                s.push(quote);
                self.advance();
            } else {
                return Ok(Token::Literal(s));
            }
        }

        Err(format!("Unterminated literal, missing closing {}", quote))
    }

    fn read_word(&mut self) -> Result<Token, String> {
        let mut word = String::new();

        while let Some(ch) = self.peek() {
            if ch.is_whitespace() || matches!(ch, ':' | '|' | '"' | '\'') {
                break;
            }
            word.push(ch);
            self.advance();
        }

        if word.chars().all(|c| c.is_ascii_digit()) {
            word.parse::<u32>()
                .map(Token::Number)
                .map_err(|_| format!("Rule id out of range: {}", word))
        } else {
            Ok(Token::Word(word))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_rule() {
        let mut lexer = Lexer::new("0: 4 1 5");
        let tokens = lexer.tokenize().unwrap();

        assert_eq!(
            tokens,
            vec![
                Token::Number(0),
                Token::Colon,
                Token::Number(4),
                Token::Number(1),
                Token::Number(5),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_alternatives() {
        let mut lexer = Lexer::new("8: 42 | 42 8");
        let tokens = lexer.tokenize().unwrap();

        assert_eq!(tokens[3], Token::Pipe);
        assert_eq!(tokens.len(), 7);
    }

    #[test]
    fn test_terminal_both_quote_styles() {
        let mut lexer = Lexer::new(r#"4: "a""#);
        assert_eq!(lexer.tokenize().unwrap()[2], Token::Literal("a".to_string()));

        let mut lexer = Lexer::new("4 : 'b'");
        assert_eq!(lexer.tokenize().unwrap()[2], Token::Literal("b".to_string()));
    }

    #[test]
    fn test_doubled_quote_escape() {
        let mut lexer = Lexer::new(r#"1: """""#);
        assert_eq!(lexer.tokenize().unwrap()[2], Token::Literal("\"".to_string()));
    }

    #[test]
    fn test_whitespace_handling() {
        let mut lexer = Lexer::new("  12   :\t3   ");
        let tokens = lexer.tokenize().unwrap();

        assert_eq!(tokens.len(), 4); // number, colon, number, eof
    }

    #[test]
    fn test_word_token() {
        let mut lexer = Lexer::new("x1: 2a");
        let tokens = lexer.tokenize().unwrap();

        assert_eq!(tokens[0], Token::Word("x1".to_string()));
        assert_eq!(tokens[2], Token::Word("2a".to_string()));
    }

    #[test]
    fn test_unterminated_literal_error() {
        let mut lexer = Lexer::new(r#"4: "a"#);
        let result = lexer.tokenize();

        assert!(result.is_err());
        assert!(result.unwrap_err().starts_with("Unterminated literal"));
    }

    #[test]
    fn test_rule_id_out_of_range() {
        let mut lexer = Lexer::new("99999999999: 1");
        assert!(lexer.tokenize().is_err());
    }
}
