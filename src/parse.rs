//! Análisis sintáctico y traducción.
//!
//! El parser es descendente recursivo, con un procedimiento por cada
//! no terminal de la gramática. No se construye un árbol sintáctico:
//! las expresiones del lenguaje y las de C comparten operadores,
//! precedencia y asociatividad, por lo cual el orden de recorrido es
//! precisamente el orden de emisión. A medida que se reconoce cada
//! construcción se instruye al [`Emitter`] qué texto agregar, y se
//! ejecutan las verificaciones estáticas de [`Scope`].
//!
//! ```text
//! program    ::= { NEWLINE } { statement }
//! statement  ::= "PRINT"  ( expression | STRING ) nl
//!             |  "IF"     comparison "THEN" nl { statement } "ENDIF" nl
//!             |  "WHILE"  comparison "REPEAT" nl { statement } "ENDWHILE" nl
//!             |  "LABEL"  IDENT nl
//!             |  "GOTO"   IDENT nl
//!             |  "LET"    IDENT "=" expression nl
//!             |  "INPUT"  IDENT nl
//! comparison ::= expression cmpop expression { cmpop expression }
//! expression ::= term   { ("+" | "-") term }
//! term       ::= unary  { ("*" | "/") unary }
//! unary      ::= [ "+" | "-" ] primary
//! primary    ::= NUMBER | IDENT
//! nl         ::= NEWLINE { NEWLINE }
//! ```

use log::{debug, trace};
use thiserror::Error;

use crate::{
    emit::Emitter,
    lex::{Keyword, Lexer, LexerError, Token, TokenKind},
    semantic::{Identifier, Scope, SemanticError},
    source::Located,
};

#[non_exhaustive]
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParserError {
    #[error("Expected {0}, got {1}.")]
    Expected(TokenKind, TokenKind),

    #[error("Invalid statement at {0}")]
    InvalidStatement(String),

    #[error("Expected comparison operator at: {0}")]
    ExpectedComparison(String),

    #[error("Unexpected token at {0}")]
    UnexpectedToken(String),
}

/// Error fatal de cualquiera de las fases.
#[derive(Debug)]
pub enum Failure {
    Lexical(Located<LexerError>),
    Syntax(Located<ParserError>),
    Semantic(Located<SemanticError>),
}

impl From<Located<LexerError>> for Failure {
    fn from(error: Located<LexerError>) -> Self {
        Failure::Lexical(error)
    }
}

impl From<Located<ParserError>> for Failure {
    fn from(error: Located<ParserError>) -> Self {
        Failure::Syntax(error)
    }
}

impl From<Located<SemanticError>> for Failure {
    fn from(error: Located<SemanticError>) -> Self {
        Failure::Semantic(error)
    }
}

type Parse<T> = Result<T, Failure>;

/// Traduce un programa completo.
///
/// El emisor recibe el programa en C solamente si esta función retorna
/// `Ok`; ante cualquier error su contenido debe descartarse.
pub fn parse(lexer: Lexer, emitter: &mut Emitter) -> Result<(), Failure> {
    let mut parser = Parser::new(lexer, emitter)?;
    parser.program()?;

    parser.scope.finish()?;
    Ok(())
}

struct Parser<'e> {
    lexer: Lexer,
    emitter: &'e mut Emitter,
    scope: Scope,
    current: Located<Token>,
    peek: Located<Token>,
}

impl<'e> Parser<'e> {
    fn new(mut lexer: Lexer, emitter: &'e mut Emitter) -> Parse<Self> {
        // Se inicializan tanto el token actual como el de lookahead
        let current = lexer.next_token()?;
        let peek = lexer.next_token()?;

        Ok(Parser {
            lexer,
            emitter,
            scope: Scope::default(),
            current,
            peek,
        })
    }

    fn program(&mut self) -> Parse<()> {
        trace!("PROGRAM");

        self.emitter.header_line("#include <stdio.h>");
        self.emitter.header_line("int main(void){");

        // Líneas en blanco al inicio del programa
        while self.check(TokenKind::Newline) {
            self.advance()?;
        }

        while !self.check(TokenKind::Eof) {
            self.statement()?;
        }

        self.emitter.emit_line("return 0;");
        self.emitter.emit_line("}");

        Ok(())
    }

    fn statement(&mut self) -> Parse<()> {
        match self.kind() {
            TokenKind::Keyword(Keyword::Print) => self.print()?,
            TokenKind::Keyword(Keyword::If) => self.if_statement()?,
            TokenKind::Keyword(Keyword::While) => self.while_statement()?,
            TokenKind::Keyword(Keyword::Label) => self.label()?,
            TokenKind::Keyword(Keyword::Goto) => self.goto()?,
            TokenKind::Keyword(Keyword::Let) => self.let_statement()?,
            TokenKind::Keyword(Keyword::Input) => self.input()?,

            _ => {
                let text = self.current.val().text().to_owned();
                return self.fail(ParserError::InvalidStatement(text));
            }
        }

        self.nl()
    }

    fn print(&mut self) -> Parse<()> {
        trace!("STATEMENT-PRINT");
        self.advance()?;

        if self.check(TokenKind::String) {
            let line = format!("printf(\"{}\\n\");", self.current.val().text());
            self.emitter.emit_line(&line);
            self.advance()
        } else {
            self.emitter.emit("printf(\"%.2f\\n\", (float)(");
            self.expression()?;
            self.emitter.emit_line("));");

            Ok(())
        }
    }

    fn if_statement(&mut self) -> Parse<()> {
        trace!("STATEMENT-IF");
        self.advance()?;

        self.emitter.emit("if(");
        self.comparison()?;

        self.matches(TokenKind::Keyword(Keyword::Then))?;
        self.nl()?;
        self.emitter.emit_line("){");

        self.block(TokenKind::Keyword(Keyword::EndIf))
    }

    fn while_statement(&mut self) -> Parse<()> {
        trace!("STATEMENT-WHILE");
        self.advance()?;

        self.emitter.emit("while(");
        self.comparison()?;

        self.matches(TokenKind::Keyword(Keyword::Repeat))?;
        self.nl()?;
        self.emitter.emit_line("){");

        self.block(TokenKind::Keyword(Keyword::EndWhile))
    }

    /// Sentencias hasta el token de cierre, el cual se consume.
    fn block(&mut self, end: TokenKind) -> Parse<()> {
        while !self.check(end) {
            // Sin esto, un bloque sin cerrar recibiría EOF como sentencia
            if self.check(TokenKind::Eof) {
                return self.fail(ParserError::Expected(end, TokenKind::Eof));
            }

            self.statement()?;
        }

        self.advance()?;
        self.emitter.emit_line("}");

        Ok(())
    }

    fn label(&mut self) -> Parse<()> {
        trace!("STATEMENT-LABEL");
        self.advance()?;

        let id = self.ident()?;
        self.scope.declare_label(&id)?;

        debug!("Label `{}` declared at {}", id.val(), id.location());
        self.emitter.emit_line(&format!("{}:;", id.val()));

        Ok(())
    }

    fn goto(&mut self) -> Parse<()> {
        trace!("STATEMENT-GOTO");
        self.advance()?;

        let id = self.ident()?;
        self.emitter.emit_line(&format!("goto {};", id.val()));
        self.scope.goto(id)?;

        Ok(())
    }

    /// `LET` introduce su variable luego de traducir el valor inicial.
    /// Por lo tanto, `LET x = x + 1` con una `x` nueva es un error de uso
    /// antes de asignación, en lugar de leer un `float` sin inicializar.
    fn let_statement(&mut self) -> Parse<()> {
        trace!("STATEMENT-LET");
        self.advance()?;

        let id = self.ident()?;
        self.emitter.emit(&format!("{} = ", id.val()));

        // La variable no existe todavía mientras se evalúa su valor inicial
        self.matches(TokenKind::Eq)?;
        self.expression()?;
        self.introduce(&id)?;
        self.emitter.emit_line(";");

        Ok(())
    }

    fn input(&mut self) -> Parse<()> {
        trace!("STATEMENT-INPUT");
        self.advance()?;

        let id = self.ident()?;
        self.introduce(&id)?;

        // Una entrada no numérica deja la variable en cero y descarta el token
        let name = id.val();
        self.emitter
            .emit_line(&format!("if (0 == scanf(\"%f\", &{})) {{", name));
        self.emitter.emit_line(&format!("{} = 0;", name));
        self.emitter.emit_line("scanf(\"%*s\");");
        self.emitter.emit_line("}");

        Ok(())
    }

    /// Declara una variable en la cabecera la primera vez que se observa.
    fn introduce(&mut self, id: &Located<Identifier>) -> Parse<()> {
        if self.scope.introduce(id)? {
            debug!("Variable `{}` introduced at {}", id.val(), id.location());
            self.emitter.header_line(&format!("float {};", id.val()));
        }

        Ok(())
    }

    fn comparison(&mut self) -> Parse<()> {
        trace!("COMPARISON");

        self.expression()?;
        if !self.kind().is_comparison() {
            let text = self.current.val().text().to_owned();
            return self.fail(ParserError::ExpectedComparison(text));
        }

        while self.kind().is_comparison() {
            self.operator()?;
            self.expression()?;
        }

        Ok(())
    }

    fn expression(&mut self) -> Parse<()> {
        trace!("EXPRESSION");

        self.term()?;
        while self.check(TokenKind::Plus) || self.check(TokenKind::Minus) {
            self.operator()?;
            self.term()?;
        }

        Ok(())
    }

    fn term(&mut self) -> Parse<()> {
        trace!("TERM");

        self.unary()?;
        while self.check(TokenKind::Asterisk) || self.check(TokenKind::Slash) {
            self.operator()?;
            self.unary()?;
        }

        Ok(())
    }

    fn unary(&mut self) -> Parse<()> {
        trace!("UNARY");

        if self.check(TokenKind::Plus) || self.check(TokenKind::Minus) {
            self.paste()?;
        }

        self.primary()
    }

    fn primary(&mut self) -> Parse<()> {
        trace!("PRIMARY ({})", self.current.val().text());

        match self.kind() {
            TokenKind::Number => self.paste(),
            TokenKind::Ident => {
                let id = self.current.clone().map(identifier);
                self.scope.read(&id)?;
                self.paste()
            }

            _ => {
                let text = self.current.val().text().to_owned();
                self.fail(ParserError::UnexpectedToken(text))
            }
        }
    }

    /// Línea nueva obligatoria, seguida de cualquier cantidad de líneas en blanco.
    fn nl(&mut self) -> Parse<()> {
        trace!("NEWLINE");

        self.matches(TokenKind::Newline)?;
        while self.check(TokenKind::Newline) {
            self.advance()?;
        }

        Ok(())
    }

    /// Consume un identificador.
    fn ident(&mut self) -> Parse<Located<Identifier>> {
        let id = self.current.clone().map(identifier);
        self.matches(TokenKind::Ident)?;

        Ok(id)
    }

    /// Copia el lexema actual tal cual al cuerpo y avanza.
    fn paste(&mut self) -> Parse<()> {
        self.emitter.emit(self.current.val().text());
        self.advance()
    }

    /// Copia un operador binario entre espacios, de forma que nunca
    /// queda adyacente a un signo unario (`a - -1`, nunca `a--1`).
    fn operator(&mut self) -> Parse<()> {
        self.emitter.emit(" ");
        self.paste()?;
        self.emitter.emit(" ");

        Ok(())
    }

    fn kind(&self) -> TokenKind {
        self.current.val().kind()
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.kind() == kind
    }

    fn matches(&mut self, kind: TokenKind) -> Parse<()> {
        if !self.check(kind) {
            return self.fail(ParserError::Expected(kind, self.kind()));
        }

        self.advance()
    }

    fn advance(&mut self) -> Parse<()> {
        let next = self.lexer.next_token()?;
        self.current = std::mem::replace(&mut self.peek, next);

        Ok(())
    }

    fn fail<T>(&self, error: ParserError) -> Parse<T> {
        Err(Failure::Syntax(Located::at(
            error,
            self.current.location().clone(),
        )))
    }
}

fn identifier(token: Token) -> Identifier {
    Identifier::from(token.shared_text())
}
