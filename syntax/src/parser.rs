//! The language parser implementation.
//!
//! This is a handwritten, recursive descent parser. Finch follows the
//! Smalltalk precedence ladder: unary messages bind tightest, then binary
//! operators (strictly left to right, no precedence between operators), then
//! keyword messages. A keyword message written without a receiver is sent to
//! the global environment object.

use crate::ast::*;
use crate::error::ParseError;
use crate::lexer::Lexer;
use crate::source::{SourceFile, Span};
use crate::tokens::{Token, TokenInfo};

/// The instruction set expresses message sends of up to ten arguments.
const MAX_MESSAGE_ARGS: usize = 10;

/// Attempt to parse a source file into an abstract syntax tree.
///
/// If the given file contains a valid Finch program, a root block is returned
/// representing the program. Otherwise the first syntax error is returned.
pub fn parse(file: impl Into<SourceFile>) -> Result<Block, ParseError> {
    Parser::new(Lexer::from(file.into())).parse_program()
}

/// A parser instance that manages parsing state.
struct Parser {
    /// A lexer instance where tokens are parsed from.
    lexer: Lexer,

    /// The current token being parsed.
    current: Option<TokenInfo>,

    /// One token of lookahead past the current one, used to recognize the
    /// assignment arrows without backtracking.
    next: Option<TokenInfo>,
}

impl Parser {
    fn new(lexer: Lexer) -> Self {
        Self {
            lexer,
            current: None,
            next: None,
        }
    }

    /// Program => (Statement Separator)*
    fn parse_program(&mut self) -> Result<Block, ParseError> {
        let mut body = Vec::new();

        loop {
            match self.current_token()? {
                Token::EndOfLine | Token::EndOfStatement => {
                    self.advance_token()?;
                }
                Token::EndOfFile => break,
                _ => body.push(self.parse_statement()?),
            }
        }

        Ok(Block {
            params: Vec::new(),
            body,
        })
    }

    /// Statement => 'undef' Name
    ///            | Name '<-' Expr
    ///            | Name '<--' Expr
    ///            | Expr
    fn parse_statement(&mut self) -> Result<Expr, ParseError> {
        if let Token::Name(name) = self.current_token()? {
            if name == "undef" {
                if let Token::Name(target) = self.peek_token()? {
                    self.advance_token()?;
                    self.advance_token()?;
                    return Ok(Expr::Undefine { name: target });
                }
            }

            match self.peek_token()? {
                Token::DefineArrow => {
                    self.advance_token()?;
                    self.advance_token()?;
                    let value = self.parse_expression()?;
                    return Ok(Expr::Define {
                        name,
                        value: Box::new(value),
                    });
                }
                Token::AssignArrow => {
                    self.advance_token()?;
                    self.advance_token()?;
                    let value = self.parse_expression()?;
                    return Ok(Expr::Assign {
                        name,
                        value: Box::new(value),
                    });
                }
                _ => {}
            }
        }

        self.parse_expression()
    }

    /// Expr => KeywordMessage
    fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        self.parse_keyword_message()
    }

    /// KeywordMessage => Binary (Keyword Binary)*
    ///                 | (Keyword Binary)+
    fn parse_keyword_message(&mut self) -> Result<Expr, ParseError> {
        // A statement may open directly with a keyword, in which case the
        // message has no written receiver.
        let receiver = match self.current_token()? {
            Token::Keyword(_) => None,
            _ => Some(self.parse_binary()?),
        };

        if let Token::Keyword(_) = self.current_token()? {
            let mut selector = String::new();
            let mut args = Vec::new();

            while let Token::Keyword(part) = self.current_token()? {
                self.advance_token()?;
                self.skip_newlines()?;
                selector.push_str(&part);
                args.push(self.parse_binary()?);
            }

            if args.len() > MAX_MESSAGE_ARGS {
                return Err(self.error(format!("message '{}' has too many arguments", selector)));
            }

            return Ok(Expr::Message {
                receiver: receiver.map(Box::new),
                selector,
                args,
            });
        }

        // No keyword followed, so this is just the operand itself.
        Ok(receiver.unwrap())
    }

    /// Binary => Unary (Operator Unary)*
    fn parse_binary(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_unary()?;

        while let Token::Operator(selector) = self.current_token()? {
            self.advance_token()?;
            self.skip_newlines()?;
            let arg = self.parse_unary()?;
            expr = Expr::Message {
                receiver: Some(Box::new(expr)),
                selector,
                args: vec![arg],
            };
        }

        Ok(expr)
    }

    /// Unary => Primary Name*
    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_primary()?;

        while let Token::Name(selector) = self.current_token()? {
            self.advance_token()?;
            expr = Expr::Message {
                receiver: Some(Box::new(expr)),
                selector,
                args: Vec::new(),
            };
        }

        Ok(expr)
    }

    /// Primary => Number | String | 'self' | Name
    ///          | '(' Expr ')' | Block | Array
    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        match self.current_token()? {
            Token::Number(value) => {
                self.advance_token()?;
                Ok(Expr::Number(value))
            }
            Token::String(value) => {
                self.advance_token()?;
                Ok(Expr::String(value))
            }
            Token::Name(name) => {
                self.advance_token()?;
                if name == "self" {
                    Ok(Expr::SelfRef)
                } else {
                    Ok(Expr::Name(name))
                }
            }
            Token::LeftParen => {
                self.advance_token()?;
                self.skip_newlines()?;
                let expr = self.parse_expression()?;
                self.skip_newlines()?;
                self.expect(Token::RightParen)?;
                Ok(expr)
            }
            Token::LeftBrace => self.parse_block().map(Expr::Block),
            Token::LeftBracket => self.parse_array(),
            token => Err(self.error(format!("expected expression, instead got {:?}", token))),
        }
    }

    /// Block       => '{' BlockParams? BlockBody '}'
    /// BlockParams => '|' Name* '|'
    fn parse_block(&mut self) -> Result<Block, ParseError> {
        self.expect(Token::LeftBrace)?;
        self.skip_newlines()?;

        let mut params = Vec::new();

        if self.current_token()? == Token::Pipe {
            self.advance_token()?;

            loop {
                match self.current_token()? {
                    Token::Pipe => {
                        self.advance_token()?;
                        break;
                    }
                    Token::Name(name) => {
                        self.advance_token()?;
                        params.push(name);
                    }
                    token => {
                        return Err(
                            self.error(format!("expected parameter name, instead got {:?}", token))
                        )
                    }
                }
            }
        }

        let mut body = Vec::new();

        loop {
            match self.current_token()? {
                Token::EndOfLine | Token::EndOfStatement => {
                    self.advance_token()?;
                }
                Token::RightBrace => {
                    self.advance_token()?;
                    break;
                }
                Token::EndOfFile => return Err(self.error("unterminated block")),
                _ => body.push(self.parse_statement()?),
            }
        }

        Ok(Block { params, body })
    }

    /// Array => '[' (Expr (',' Expr)*)? ','? ']'
    fn parse_array(&mut self) -> Result<Expr, ParseError> {
        self.expect(Token::LeftBracket)?;

        let mut items = Vec::new();

        loop {
            match self.current_token()? {
                Token::RightBracket => {
                    self.advance_token()?;
                    break;
                }
                Token::Comma | Token::EndOfLine => {
                    self.advance_token()?;
                }
                Token::EndOfFile => return Err(self.error("unterminated array literal")),
                _ => items.push(self.parse_expression()?),
            }
        }

        Ok(Expr::Array(items))
    }

    fn skip_newlines(&mut self) -> Result<(), ParseError> {
        while self.current_token()? == Token::EndOfLine {
            self.advance_token()?;
        }

        Ok(())
    }

    /// If the current token matches the given token, consume it, otherwise
    /// raise an error.
    fn expect(&mut self, token: Token) -> Result<(), ParseError> {
        let current = self.current_token()?;

        if current != token {
            return Err(self.error(format!("expected token: {:?}, instead got {:?}", token, current)));
        }

        self.advance_token()
    }

    /// Get the current token being parsed.
    fn current_token(&mut self) -> Result<Token, ParseError> {
        if self.current.is_none() {
            self.current = Some(self.lexer.lex()?);
        }

        Ok(self.current.clone().unwrap().token)
    }

    /// Get the token following the current one.
    fn peek_token(&mut self) -> Result<Token, ParseError> {
        self.current_token()?;

        if self.next.is_none() {
            self.next = Some(self.lexer.lex()?);
        }

        Ok(self.next.clone().unwrap().token)
    }

    /// Consume the current token, advancing to the next token in the file.
    fn advance_token(&mut self) -> Result<(), ParseError> {
        self.current = match self.next.take() {
            Some(info) => Some(info),
            None => Some(self.lexer.lex()?),
        };

        Ok(())
    }

    /// Construct a context-sensitive error message.
    fn error(&self, message: impl Into<String>) -> ParseError {
        let span = self
            .current
            .as_ref()
            .map(|info| info.span)
            .unwrap_or_else(Span::default);

        ParseError::new(message, span)
    }
}
