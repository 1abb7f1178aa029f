//! Análisis léxico.
//!
//! # Tokenization
//! Esta es la primera fase del compilador. Descompone el texto de un
//! [`Source`] en unidades léxicas denominadas tokens, bajo demanda: el
//! parser solicita cada token con [`Lexer::next_token()`] y el lexer no
//! mantiene ninguna cola. Los espacios en blanco y los comentarios se
//! descartan durante esta operación. Cada token emitido está asociado a
//! una ubicación en el código fuente original.
//!
//! # Contenido de un token
//! Todo token conserva su lexema exacto, ya que el emisor copia
//! operadores, números e identificadores tal cual al código C. Las
//! cadenas son la excepción: su lexema excluye las comillas.
//!
//! # Reglas importantes del lenguaje
//! - Las nuevas líneas son significativas; `' '`, `'\t'` y `'\r'` no.
//! - Los comentarios inician con `#` y terminan al final de la línea.
//! - Las palabras clave son case-sensitive.
//! - Las cadenas no admiten `'\r'`, `'\t'`, `'\\'` ni `'%'`.
//!
//! # Errores
//! Todo error léxico es fatal. El lexer no se resincroniza.

use crate::source::{Located, Location, Position, Source};
use std::{
    fmt::{self, Display},
    rc::Rc,
    str::FromStr,
};

use thiserror::Error;

/// Error de escaneo.
#[non_exhaustive]
#[derive(Error, Debug, PartialEq, Eq)]
pub enum LexerError {
    /// Carácter desconocido o inesperado en el flujo de entrada.
    #[error("Lexing error. Unknown token: {0}")]
    UnknownChar(char),

    /// `!` sin `=` a continuación.
    #[error("Lexing error. Expected !=, got !{0}")]
    BadBang(String),

    /// Carácter prohibido dentro de una cadena.
    #[error("Lexing error. Illegal character in string.")]
    BadString,

    /// La cadena no se cerró antes del fin de línea.
    #[error("Lexing error. Unterminated string.")]
    UnterminatedString,

    /// Un `.` en una constante numérica debe seguirse de un dígito.
    #[error("Lexing error. Illegal character in number.")]
    BadNumber,
}

/// Una palabra clave.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Keyword {
    Label,
    Goto,
    Print,
    Input,
    Let,
    If,
    Then,
    EndIf,
    While,
    Repeat,
    EndWhile,
}

/// Tabla de búsqueda exacta de palabras clave.
const KEYWORDS: &[(&str, Keyword)] = &[
    ("LABEL",    Keyword::Label),
    ("GOTO",     Keyword::Goto),
    ("PRINT",    Keyword::Print),
    ("INPUT",    Keyword::Input),
    ("LET",      Keyword::Let),
    ("IF",       Keyword::If),
    ("THEN",     Keyword::Then),
    ("ENDIF",    Keyword::EndIf),
    ("WHILE",    Keyword::While),
    ("REPEAT",   Keyword::Repeat),
    ("ENDWHILE", Keyword::EndWhile),
];

impl Display for Keyword {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = KEYWORDS
            .iter()
            .find(|&&(_, keyword)| keyword == *self)
            .map(|&(name, _)| name)
            .unwrap_or_default();

        fmt.write_str(name)
    }
}

impl FromStr for Keyword {
    type Err = ();

    fn from_str(string: &str) -> Result<Self, Self::Err> {
        KEYWORDS
            .iter()
            .find(|&&(name, _)| name == string)
            .map(|&(_, keyword)| keyword)
            .ok_or(())
    }
}

/// Clase de un token.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TokenKind {
    Eof,
    Newline,
    Number,
    Ident,
    String,

    /// Palabra clave.
    Keyword(Keyword),

    /// `=`
    Eq,

    /// `+`
    Plus,

    /// `-`
    Minus,

    /// `*`
    Asterisk,

    /// `/`
    Slash,

    /// `==`
    EqEq,

    /// `!=`
    NotEq,

    /// `<`
    Lt,

    /// `<=`
    LtEq,

    /// `>`
    Gt,

    /// `>=`
    GtEq,
}

impl TokenKind {
    /// Determina si el token es un operador de comparación.
    pub fn is_comparison(self) -> bool {
        use TokenKind::*;
        matches!(self, EqEq | NotEq | Lt | LtEq | Gt | GtEq)
    }
}

impl Display for TokenKind {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        use TokenKind::*;

        let name = match self {
            Keyword(keyword) => return Display::fmt(keyword, fmt),
            Eof => "EOF",
            Newline => "NEWLINE",
            Number => "NUMBER",
            Ident => "IDENT",
            String => "STRING",
            Eq => "EQ",
            Plus => "PLUS",
            Minus => "MINUS",
            Asterisk => "ASTERISK",
            Slash => "SLASH",
            EqEq => "EQEQ",
            NotEq => "NOTEQ",
            Lt => "LT",
            LtEq => "LTEQ",
            Gt => "GT",
            GtEq => "GTEQ",
        };

        fmt.write_str(name)
    }
}

/// Objeto resultante del análisis léxico.
///
/// Un token contiene suficiente información para describir completamente
/// a una entidad léxica en el programa fuente.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    kind: TokenKind,
    text: Rc<str>,
}

impl Token {
    /// Clase del token.
    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    /// Lexema exacto.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Lexema compartido, útil para construir identificadores.
    pub fn shared_text(&self) -> Rc<str> {
        Rc::clone(&self.text)
    }
}

impl Display for Token {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "{}: {}", self.text.escape_default(), self.kind)
    }
}

/// Lexer por demanda.
///
/// Mantiene un cursor sobre los caracteres del origen y un único
/// carácter de lookahead. Al sobrepasar el final del texto el cursor
/// queda estacionado en "sin carácter", lo cual produce [`TokenKind::Eof`]
/// indefinidamente.
pub struct Lexer {
    source: Rc<Source>,
    chars: Vec<char>,
    cursor: usize,
    current: Option<char>,
    position: Position,
    last: Position,
    done: bool,
}

impl Lexer {
    /// Crea un lexer posicionado en el primer carácter del origen.
    pub fn new(source: Rc<Source>) -> Self {
        let chars: Vec<char> = source.text().chars().collect();
        let current = chars.first().copied();

        Lexer {
            source,
            chars,
            cursor: 0,
            current,
            position: Position::default(),
            last: Position::default(),
            done: false,
        }
    }

    /// Retorna el siguiente token.
    pub fn next_token(&mut self) -> Result<Located<Token>, Located<LexerError>> {
        use TokenKind::{
            Asterisk, Eof, Eq, EqEq, Gt, GtEq, Lt, LtEq, Minus, Newline, NotEq, Plus, Slash,
        };

        self.skip_whitespace();
        self.skip_comment();

        let start = self.position;
        let begin = self.cursor;

        let kind = match self.current {
            // Fin de la entrada, no se avanza
            None => {
                let location = Location::single(Rc::clone(&self.source), start);
                let token = Token {
                    kind: Eof,
                    text: Rc::from(""),
                };

                return Ok(Located::at(token, location));
            }

            Some('+') => Plus,
            Some('-') => Minus,
            Some('*') => Asterisk,
            Some('/') => Slash,
            Some('\n') => Newline,

            // Operadores de uno o dos caracteres
            Some('=') => self.pair(EqEq, Eq),
            Some('<') => self.pair(LtEq, Lt),
            Some('>') => self.pair(GtEq, Gt),
            Some('!') => match self.peek() {
                Some('=') => {
                    self.next_char();
                    NotEq
                }

                next => {
                    let got = next.map(|c| c.escape_default().to_string());
                    return Err(self.fail(LexerError::BadBang(got.unwrap_or_default())));
                }
            },

            Some('"') => return self.string(start),
            Some(c) if c.is_ascii_digit() => self.number()?,
            Some(c) if c.is_ascii_alphabetic() => self.word(),

            Some(c) => return Err(self.fail(LexerError::UnknownChar(c))),
        };

        // El lexema termina en el carácter actual
        let text: String = self.chars[begin..=self.cursor].iter().collect();
        self.next_char();

        Ok(self.located(kind, text, start))
    }

    /// Avanza el cursor un carácter.
    fn next_char(&mut self) {
        if let Some(c) = self.current {
            self.last = self.position;
            self.position = self.position.after(c);
            self.cursor += 1;
            self.current = self.chars.get(self.cursor).copied();
        }
    }

    /// Carácter de lookahead.
    fn peek(&self) -> Option<char> {
        self.chars.get(self.cursor + 1).copied()
    }

    /// Omite espacios en blanco, excepto nuevas líneas.
    fn skip_whitespace(&mut self) {
        while let Some(' ' | '\t' | '\r') = self.current {
            self.next_char();
        }
    }

    /// Omite un comentario hasta, pero sin incluir, el siguiente `'\n'`.
    fn skip_comment(&mut self) {
        if self.current == Some('#') {
            while !matches!(self.current, Some('\n') | None) {
                self.next_char();
            }
        }
    }

    /// Operador de dos caracteres si sigue `=`, o de uno si no.
    fn pair(&mut self, with_eq: TokenKind, alone: TokenKind) -> TokenKind {
        if self.peek() == Some('=') {
            self.next_char();
            with_eq
        } else {
            alone
        }
    }

    /// Constante numérica: `DIGIT+ ('.' DIGIT+)?`.
    fn number(&mut self) -> Result<TokenKind, Located<LexerError>> {
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.next_char();
        }

        if self.peek() == Some('.') {
            self.next_char();

            // Debe haber al menos un dígito después del punto
            if !matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                self.next_char();
                return Err(self.fail(LexerError::BadNumber));
            }

            while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                self.next_char();
            }
        }

        Ok(TokenKind::Number)
    }

    /// Identificador o palabra clave.
    fn word(&mut self) -> TokenKind {
        let begin = self.cursor;
        while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric()) {
            self.next_char();
        }

        let word: String = self.chars[begin..=self.cursor].iter().collect();
        match Keyword::from_str(&word) {
            Ok(keyword) => TokenKind::Keyword(keyword),
            Err(()) => TokenKind::Ident,
        }
    }

    /// Literal de cadena. El lexema no incluye las comillas.
    fn string(&mut self, start: Position) -> Result<Located<Token>, Located<LexerError>> {
        self.next_char();

        let begin = self.cursor;
        loop {
            match self.current {
                Some('"') => break,
                None | Some('\n') => return Err(self.fail(LexerError::UnterminatedString)),
                Some('\r' | '\t' | '\\' | '%') => return Err(self.fail(LexerError::BadString)),
                Some(_) => self.next_char(),
            }
        }

        let text: String = self.chars[begin..self.cursor].iter().collect();
        self.next_char();

        Ok(self.located(TokenKind::String, text, start))
    }

    /// Construye un token que abarca desde `start` hasta el último
    /// carácter consumido.
    fn located(&self, kind: TokenKind, text: String, start: Position) -> Located<Token> {
        let end = if self.last.line() == start.line() {
            self.last.advance()
        } else {
            start.advance()
        };

        let location = Location::new(Rc::clone(&self.source), start..end);
        let token = Token {
            kind,
            text: Rc::from(text),
        };

        Located::at(token, location)
    }

    /// Error en la posición actual.
    fn fail(&self, error: LexerError) -> Located<LexerError> {
        Located::at(error, Location::single(Rc::clone(&self.source), self.position))
    }
}

impl Iterator for Lexer {
    type Item = Result<Located<Token>, Located<LexerError>>;

    /// Produce todos los tokens hasta e incluyendo [`TokenKind::Eof`],
    /// deteniéndose también luego del primer error.
    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let result = self.next_token();
        self.done = match &result {
            Ok(token) => token.as_ref().kind() == TokenKind::Eof,
            Err(_) => true,
        };

        Some(result)
    }
}
