//! Compilador de Tiny BASIC a C.
//!
//! # Pipeline
//! Cada programa deriva de un único archivo de código fuente, descrito
//! por [`source::Source`]. La traducción ocurre en una sola pasada y sin
//! representación intermedia: el parser de [`parse`] solicita tokens al
//! lexer de [`lex`] conforme los necesita, verifica las reglas estáticas
//! del lenguaje con la tabla de [`semantic`] y dicta al emisor de
//! [`emit`] el texto C correspondiente a cada construcción reconocida.
//!
//! # Salida
//! El resultado es un archivo C portable con una única función `main()`.
//! Toda variable del programa es un `float` declarado al inicio de
//! `main()`. La salida se escribe solamente si la traducción concluye
//! sin errores; de lo contrario se reportan [`error::Diagnostics`].

pub mod emit;
pub mod error;
pub mod lex;
pub mod parse;
pub mod semantic;
pub mod source;

use std::rc::Rc;

use emit::{Destination, Emitter};
use lex::Lexer;
use parse::Failure;
use source::Source;

/// Traduce un programa completo a un emisor listo para escribirse.
pub fn translate(source: Rc<Source>, destination: Destination) -> Result<Emitter, Failure> {
    let mut emitter = Emitter::new(destination);
    parse::parse(Lexer::new(source), &mut emitter)?;

    Ok(emitter)
}
