//! The AST to bytecode compiler.
//!
//! The compiler interns every string literal and message name into the
//! environment's string table, registers nested block literals in the block
//! table, and picks the define/assign/load/undefine opcode variants from
//! the spelling of the name involved: a leading capital letter is a global,
//! a leading underscore is an object field, anything else is a local.

use crate::bytecode::{CodeBlock, Instruction, Opcode};
use crate::environment::Environment;
use crate::strings::FinchString;
use finch_syntax::ast::Expr;

/// The scope a name acts on, derived from its spelling.
enum NameForm {
    Global,
    Object,
    Local,
}

impl NameForm {
    fn of(name: &str) -> NameForm {
        match name.chars().next() {
            Some('_') => NameForm::Object,
            Some(c) if c.is_ascii_uppercase() => NameForm::Global,
            _ => NameForm::Local,
        }
    }
}

/// Compile a block body into a fresh code block holding the given parameter
/// names.
///
/// Every statement's value except the last is popped; the last is left on
/// the operand stack as the block's result, and an empty body answers Nil.
/// Every code block ends with an end-of-block instruction.
pub(crate) fn compile(
    environment: &Environment,
    params: Vec<FinchString>,
    body: &[Expr],
) -> CodeBlock {
    let mut code = CodeBlock::new(params);

    match body.split_last() {
        Some((last, rest)) => {
            for expr in rest {
                compile_expr(environment, &mut code, expr);
                code.write(Instruction::new(Opcode::Pop));
            }

            compile_expr(environment, &mut code, last);
        }
        None => {
            let nil = environment.strings().intern("Nil");
            code.write(Instruction::with_id(Opcode::LoadGlobal, nil));
        }
    }

    code.write(Instruction::new(Opcode::EndBlock));
    code
}

fn compile_expr(environment: &Environment, code: &mut CodeBlock, expr: &Expr) {
    match expr {
        Expr::Number(value) => {
            code.write(Instruction::with_number(Opcode::NumberLiteral, *value));
        }

        Expr::String(value) => {
            let id = environment.strings().intern(value.as_str());
            code.write(Instruction::with_id(Opcode::StringLiteral, id));
        }

        Expr::Name(name) => {
            let id = environment.strings().intern(name.as_str());
            let op = match NameForm::of(name) {
                NameForm::Global => Opcode::LoadGlobal,
                NameForm::Object => Opcode::LoadObject,
                NameForm::Local => Opcode::LoadLocal,
            };
            code.write(Instruction::with_id(op, id));
        }

        Expr::SelfRef => {
            code.write(Instruction::new(Opcode::LoadSelf));
        }

        Expr::Array(items) => {
            // Elements are pushed in source order; the VM reassembles them.
            for item in items {
                compile_expr(environment, code, item);
            }
            code.write(Instruction::with_id(Opcode::CreateArray, items.len() as u32));
        }

        Expr::Block(block) => {
            let params = block
                .params
                .iter()
                .map(|param| FinchString::from(param.as_str()))
                .collect();
            let id = environment.blocks().add(params, &block.body, environment);
            code.write(Instruction::with_id(Opcode::BlockLiteral, id));
        }

        Expr::Message {
            receiver,
            selector,
            args,
        } => {
            match receiver {
                Some(receiver) => compile_expr(environment, code, receiver),
                None => {
                    // A send with no written receiver goes to the global
                    // environment object.
                    let id = environment.strings().intern("Environment");
                    code.write(Instruction::with_id(Opcode::LoadGlobal, id));
                }
            }

            for arg in args {
                compile_expr(environment, code, arg);
            }

            let id = environment.strings().intern(selector.as_str());
            code.write(Instruction::with_id(Opcode::message(args.len()), id));
        }

        Expr::Define { name, value } => {
            // def answers the defined value; the VM peeks rather than pops.
            compile_expr(environment, code, value);
            let id = environment.strings().intern(name.as_str());
            let op = match NameForm::of(name) {
                NameForm::Global => Opcode::DefGlobal,
                NameForm::Object => Opcode::DefObject,
                NameForm::Local => Opcode::DefLocal,
            };
            code.write(Instruction::with_id(op, id));
        }

        Expr::Assign { name, value } => {
            compile_expr(environment, code, value);
            let id = environment.strings().intern(name.as_str());
            code.write(Instruction::with_id(Opcode::SetLocal, id));
        }

        Expr::Undefine { name } => {
            let id = environment.strings().intern(name.as_str());
            let op = match NameForm::of(name) {
                NameForm::Global => Opcode::UndefGlobal,
                NameForm::Object => Opcode::UndefObject,
                NameForm::Local => Opcode::UndefLocal,
            };
            code.write(Instruction::with_id(op, id));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile_source(environment: &Environment, source: &str) -> std::rc::Rc<CodeBlock> {
        let program = finch_syntax::parse(source).unwrap();
        let id = environment
            .blocks()
            .add(Vec::new(), &program.body, environment);
        environment.blocks().find(id).unwrap()
    }

    fn opcodes(code: &CodeBlock) -> Vec<Opcode> {
        code.code().iter().map(|i| i.op).collect()
    }

    #[test]
    fn literals_and_sends() {
        let env = Environment::new();
        let code = compile_source(&env, "1 + 2");

        assert_eq!(
            opcodes(&code),
            vec![
                Opcode::NumberLiteral,
                Opcode::NumberLiteral,
                Opcode::Message1,
                Opcode::EndBlock,
            ]
        );
    }

    #[test]
    fn statements_pop_between_expressions() {
        let env = Environment::new();
        let code = compile_source(&env, "1. 2");

        assert_eq!(
            opcodes(&code),
            vec![
                Opcode::NumberLiteral,
                Opcode::Pop,
                Opcode::NumberLiteral,
                Opcode::EndBlock,
            ]
        );
    }

    #[test]
    fn name_forms_pick_scopes() {
        let env = Environment::new();
        let code = compile_source(&env, "a <- 1. A <- 2. _a <- 3");

        assert_eq!(
            opcodes(&code),
            vec![
                Opcode::NumberLiteral,
                Opcode::DefLocal,
                Opcode::Pop,
                Opcode::NumberLiteral,
                Opcode::DefGlobal,
                Opcode::Pop,
                Opcode::NumberLiteral,
                Opcode::DefObject,
                Opcode::EndBlock,
            ]
        );
    }

    #[test]
    fn implicit_receiver_loads_the_environment_global() {
        let env = Environment::new();
        let code = compile_source(&env, "write-line: 1");

        assert_eq!(code.code()[0].op, Opcode::LoadGlobal);
        assert_eq!(
            env.strings().find(code.code()[0].id().unwrap()).unwrap(),
            "Environment"
        );
        assert_eq!(code.code()[2].op, Opcode::Message1);
        assert_eq!(
            env.strings().find(code.code()[2].id().unwrap()).unwrap(),
            "write-line:"
        );
    }

    #[test]
    fn empty_blocks_answer_nil() {
        let env = Environment::new();
        let code = compile_source(&env, "");

        assert_eq!(opcodes(&code), vec![Opcode::LoadGlobal, Opcode::EndBlock]);
    }

    #[test]
    fn nested_blocks_register_in_the_block_table() {
        let env = Environment::new();
        let code = compile_source(&env, "{ |x| x }");

        assert_eq!(opcodes(&code), vec![Opcode::BlockLiteral, Opcode::EndBlock]);

        let inner = env.blocks().find(code.code()[0].id().unwrap()).unwrap();
        assert_eq!(inner.params().len(), 1);
        assert_eq!(inner.params()[0], "x");
        assert_eq!(opcodes(&inner), vec![Opcode::LoadLocal, Opcode::EndBlock]);
    }
}
